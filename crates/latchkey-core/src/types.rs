use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::{Choice, ConstantTimeEq};

/// Longest card identifier accepted, in characters.
///
/// ISO 14443 UIDs are at most 10 bytes (20 hex digits); the extra room
/// leaves space for reader-specific prefixes on manually entered ids.
pub const MAX_CARD_UID_LENGTH: usize = 32;

/// Compare two secrets without a length- or position-dependent early exit.
///
/// The loop always runs over the longer input and the length difference is
/// folded into the result, so the time taken depends only on the longer
/// length.
///
/// # Examples
///
/// ```
/// use latchkey_core::secure_eq;
///
/// assert!(secure_eq("123456", "123456"));
/// assert!(!secure_eq("123456", "1234567"));
/// assert!(!secure_eq("", "0"));
/// ```
#[must_use]
pub fn secure_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let len = a.len().max(b.len());

    let mut equal = Choice::from(1u8);
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        equal &= x.ct_eq(&y);
    }
    equal &= (a.len() as u64).ct_eq(&(b.len() as u64));

    equal.into()
}

/// Mask a code for logs and published snapshots, keeping the last two digits.
///
/// # Examples
///
/// ```
/// use latchkey_core::mask_code;
///
/// assert_eq!(mask_code("123456"), "****56");
/// assert_eq!(mask_code("12"), "****");
/// assert_eq!(mask_code(""), "");
/// ```
#[must_use]
pub fn mask_code(code: &str) -> String {
    let count = code.chars().count();
    match count {
        0 => String::new(),
        1 | 2 => "****".to_string(),
        _ => {
            let tail: String = code.chars().skip(count - 2).collect();
            format!("****{tail}")
        }
    }
}

/// Proximity card identifier.
///
/// Stored in normalized form: trimmed, colon separators removed, uppercase.
/// Readers deliver raw bytes which are rendered as uppercase hex; remote
/// commands usually deliver `04:ab:cd:ef` style strings. Both end up equal.
///
/// # Security
/// Equality is constant-time, since a card identifier is the credential on
/// the card path.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardUid(String);

impl CardUid {
    /// Normalize and validate a card identifier.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardUid` if the identifier is empty after
    /// normalization, longer than [`MAX_CARD_UID_LENGTH`], or contains
    /// anything but ASCII letters and digits.
    pub fn new(raw: &str) -> Result<Self> {
        let uid: String = raw
            .trim()
            .chars()
            .filter(|c| *c != ':')
            .collect::<String>()
            .to_uppercase();

        if uid.is_empty() {
            return Err(Error::InvalidCardUid("card UID is empty".to_string()));
        }

        if uid.len() > MAX_CARD_UID_LENGTH {
            return Err(Error::InvalidCardUid(format!(
                "card UID must be at most {MAX_CARD_UID_LENGTH} chars, got {}",
                uid.len()
            )));
        }

        if !uid.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidCardUid(format!(
                "card UID must be alphanumeric: {uid}"
            )));
        }

        Ok(CardUid(uid))
    }

    /// Build an identifier from the raw UID bytes returned by a reader.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardUid` if `bytes` is empty or too long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
        CardUid::new(&hex)
    }

    /// Get the normalized identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CardUid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CardUid::new(s)
    }
}

impl TryFrom<String> for CardUid {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        CardUid::new(&value)
    }
}

impl From<CardUid> for String {
    fn from(uid: CardUid) -> Self {
        uid.0
    }
}

impl PartialEq for CardUid {
    fn eq(&self, other: &Self) -> bool {
        secure_eq(&self.0, &other.0)
    }
}

impl std::hash::Hash for CardUid {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Kind of a stored PIN credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// The single long-lived code of the lock.
    Master,
    /// Valid for exactly one successful use.
    OneTime,
    /// Valid repeatedly inside its effective/expiry window.
    Timed,
}

impl CredentialKind {
    /// Wire name of the kind, as persisted.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialKind::Master => "master",
            CredentialKind::OneTime => "one_time",
            CredentialKind::Timed => "timed",
        }
    }

    /// Returns `true` for kinds stored in the temporary list.
    #[inline]
    #[must_use]
    pub fn is_temporary(self) -> bool {
        matches!(self, CredentialKind::OneTime | CredentialKind::Timed)
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CredentialKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "master" => Ok(CredentialKind::Master),
            "one_time" => Ok(CredentialKind::OneTime),
            "timed" => Ok(CredentialKind::Timed),
            other => Err(Error::UnknownCredentialKind(other.to_string())),
        }
    }
}

/// Logical state of the lock mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockStatus {
    Locked,
    Unlocked,
}

impl LockStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LockStatus::Locked => "locked",
            LockStatus::Unlocked => "unlocked",
        }
    }
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the lock changed state. Published with every lock-state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockReason {
    /// Keypad PIN accepted.
    Pin,
    /// Enrolled card presented.
    Card,
    /// Remote command.
    Remote,
    /// Auto-relock timer elapsed.
    Auto,
    /// Door closed with a zero relock delay.
    DoorClosed,
    /// Initial state after boot.
    Startup,
}

impl LockReason {
    /// Tag used in published events.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LockReason::Pin => "pin",
            LockReason::Card => "card",
            LockReason::Remote => "remote",
            LockReason::Auto => "auto",
            LockReason::DoorClosed => "door_closed",
            LockReason::Startup => "startup",
        }
    }
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LockReason {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pin" => Ok(LockReason::Pin),
            "card" => Ok(LockReason::Card),
            "remote" => Ok(LockReason::Remote),
            "auto" => Ok(LockReason::Auto),
            "door_closed" => Ok(LockReason::DoorClosed),
            "startup" => Ok(LockReason::Startup),
            other => Err(Error::UnknownLockReason(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("04:ab:cd:ef", "04ABCDEF")]
    #[case("  04abcdef ", "04ABCDEF")]
    #[case("A1B2C3D4E5F6A7", "A1B2C3D4E5F6A7")]
    #[case("1234567890", "1234567890")]
    fn test_card_uid_normalization(#[case] input: &str, #[case] expected: &str) {
        let uid = CardUid::new(input).unwrap();
        assert_eq!(uid.as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case(" : : ")]
    #[case("04-AB-CD")]
    #[case("012345678901234567890123456789012")]
    fn test_card_uid_invalid(#[case] input: &str) {
        assert!(CardUid::new(input).is_err());
    }

    #[test]
    fn test_card_uid_from_bytes() {
        let uid = CardUid::from_bytes(&[0x04, 0xAB, 0x0C, 0xEF]).unwrap();
        assert_eq!(uid.as_str(), "04AB0CEF");
        assert!(CardUid::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_card_uid_equality_after_normalization() {
        let a = CardUid::new("04:ab:cd:ef").unwrap();
        let b = CardUid::from_bytes(&[0x04, 0xAB, 0xCD, 0xEF]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_card_uid_serde_normalizes() {
        let uid: CardUid = serde_json::from_str("\"de:ad:be:ef\"").unwrap();
        assert_eq!(uid.as_str(), "DEADBEEF");
        assert_eq!(serde_json::to_string(&uid).unwrap(), "\"DEADBEEF\"");
        assert!(serde_json::from_str::<CardUid>("\"\"").is_err());
    }

    #[rstest]
    #[case("1234", "1234", true)]
    #[case("1234", "1235", false)]
    #[case("1234", "12345", false)]
    #[case("12345", "1234", false)]
    #[case("", "", true)]
    #[case("", "0", false)]
    fn test_secure_eq(#[case] a: &str, #[case] b: &str, #[case] expected: bool) {
        assert_eq!(secure_eq(a, b), expected);
    }

    #[test]
    fn test_secure_eq_trailing_nul_is_not_equal() {
        // Padding with zero bytes must not make different lengths compare equal.
        assert!(!secure_eq("1234", "1234\0"));
    }

    #[rstest]
    #[case("", "")]
    #[case("1", "****")]
    #[case("12", "****")]
    #[case("123456", "****56")]
    fn test_mask_code(#[case] code: &str, #[case] expected: &str) {
        assert_eq!(mask_code(code), expected);
    }

    #[test]
    fn test_credential_kind_round_trip() {
        for kind in [
            CredentialKind::Master,
            CredentialKind::OneTime,
            CredentialKind::Timed,
        ] {
            assert_eq!(kind.as_str().parse::<CredentialKind>().unwrap(), kind);
        }
        assert!("temp".parse::<CredentialKind>().is_err());
        assert!(CredentialKind::Timed.is_temporary());
        assert!(!CredentialKind::Master.is_temporary());
    }

    #[test]
    fn test_lock_reason_tags() {
        assert_eq!(LockReason::DoorClosed.as_str(), "door_closed");
        assert_eq!(
            serde_json::to_string(&LockReason::DoorClosed).unwrap(),
            "\"door_closed\""
        );
        assert_eq!("auto".parse::<LockReason>().unwrap(), LockReason::Auto);
        assert!("manual".parse::<LockReason>().is_err());
    }

    #[test]
    fn test_lock_status_display() {
        assert_eq!(LockStatus::Locked.to_string(), "locked");
        assert_eq!(LockStatus::Unlocked.to_string(), "unlocked");
    }
}
