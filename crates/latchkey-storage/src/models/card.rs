use latchkey_core::CardUid;
use serde::{Deserialize, Serialize};

/// An enrolled proximity card.
///
/// The identifier is normalized on construction (see [`CardUid`]), so two
/// entries for `04:ab:cd:ef` and `04ABCDEF` can never coexist. The name is
/// for display only and plays no part in authorization.
///
/// # Examples
///
/// ```
/// use latchkey_core::CardUid;
/// use latchkey_storage::models::CardEntry;
///
/// let entry = CardEntry::new(CardUid::new("04:ab:cd:ef").unwrap(), "Front desk");
/// assert_eq!(entry.uid.as_str(), "04ABCDEF");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardEntry {
    pub uid: CardUid,
    #[serde(default)]
    pub name: String,
}

impl CardEntry {
    pub fn new(uid: CardUid, name: impl Into<String>) -> Self {
        Self {
            uid,
            name: name.into(),
        }
    }
}
