use latchkey_core::{CredentialKind, mask_code};
use serde::{Deserialize, Serialize};

use super::ValidityWindow;
use crate::error::{StorageError, StorageResult};

/// A temporary PIN code held in the credential list.
///
/// The master code is not represented here: it lives in its own slot of the
/// [`CredentialStore`](crate::repositories::CredentialStore) record.
///
/// # Fields
///
/// * `code` - The secret digits. Never logged in clear, see [`masked`](Self::masked)
/// * `kind` - `one_time` or `timed`
/// * `effective_at` - Wall-clock second the code becomes usable, `0` for immediately
/// * `expire_at` - Wall-clock second the code stops working, `0` for never
///
/// # Examples
///
/// ```
/// use latchkey_storage::models::{Credential, ValidityWindow};
///
/// let visitor = Credential::timed("482913", 1_000, 2_000);
/// assert!(visitor.is_valid_at(1_500));
/// assert!(!visitor.is_valid_at(2_000));
/// assert_eq!(visitor.masked(), "****13");
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub code: String,

    pub kind: CredentialKind,

    #[serde(default)]
    pub effective_at: u64,

    #[serde(default)]
    pub expire_at: u64,
}

impl Credential {
    /// Code valid for a single successful use, with no window.
    pub fn one_time(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            kind: CredentialKind::OneTime,
            effective_at: 0,
            expire_at: 0,
        }
    }

    /// Code valid repeatedly inside `[effective_at, expire_at)`.
    pub fn timed(code: impl Into<String>, effective_at: u64, expire_at: u64) -> Self {
        Self {
            code: code.into(),
            kind: CredentialKind::Timed,
            effective_at,
            expire_at,
        }
    }

    /// Set the validity window, keeping the kind.
    #[must_use]
    pub fn with_window(mut self, effective_at: u64, expire_at: u64) -> Self {
        self.effective_at = effective_at;
        self.expire_at = expire_at;
        self
    }

    /// Check the storage invariants of a temporary entry.
    ///
    /// # Errors
    /// Returns `StorageError::Validation` if the code is empty or the kind
    /// is `master`.
    pub fn validate(&self) -> StorageResult<()> {
        if self.code.is_empty() {
            return Err(StorageError::validation("credential code is empty"));
        }
        if !self.kind.is_temporary() {
            return Err(StorageError::validation(format!(
                "kind '{}' cannot be stored in the credential list",
                self.kind
            )));
        }
        Ok(())
    }

    /// The code with everything but the last two digits hidden.
    #[must_use]
    pub fn masked(&self) -> String {
        mask_code(&self.code)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("code", &self.masked())
            .field("kind", &self.kind)
            .field("effective_at", &self.effective_at)
            .field("expire_at", &self.expire_at)
            .finish()
    }
}

impl ValidityWindow for Credential {
    fn effective_at(&self) -> u64 {
        self.effective_at
    }

    fn expire_at(&self) -> u64 {
        self.expire_at
    }
}
