//! PIN credential store.
//!
//! Holds the master code and the ordered list of temporary codes, and keeps
//! them in a single record:
//!
//! ```json
//! {"master":"246810","timestamp":1700000000,
//!  "items":[{"code":"1357","kind":"one_time","effective_at":0,"expire_at":0}]}
//! ```
//!
//! # Persistence policy
//!
//! Every mutation rewrites the record through one atomic replace. If that
//! write fails the in-memory change is kept, the store is marked dirty and
//! the error is returned so the caller knows the change is unconfirmed.
//! [`CredentialStore::flush`] retries the write; the engine calls it from
//! its periodic sweep until it succeeds.
//!
//! Temporary codes need not be unique. Lookups take the first entry with a
//! matching code, oldest first.
//!
//! # Security
//!
//! Lookups compare codes in constant time and scan the whole list even
//! after a match, so the time taken does not reveal which entry matched.

use latchkey_core::{CredentialKind, mask_code, secure_eq};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};
use crate::models::{Credential, ValidityWindow};
use crate::record::RecordStore;

/// Outcome of [`CredentialStore::validate_and_consume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    /// Code accepted; carries the kind of the matching credential.
    Authorized(CredentialKind),
    Denied(DenialReason),
}

impl AuthDecision {
    #[must_use]
    pub fn is_authorized(self) -> bool {
        matches!(self, AuthDecision::Authorized(_))
    }
}

/// Why a code was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No stored credential has this code.
    NoMatch,
    /// The matching credential had expired and was removed.
    Expired,
    /// The matching credential's window has not started yet.
    NotYetEffective,
}

impl DenialReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DenialReason::NoMatch => "no_match",
            DenialReason::Expired => "expired",
            DenialReason::NotYetEffective => "not_yet_effective",
        }
    }
}

/// Counts from a [`load`](CredentialStore::load).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Entries restored.
    pub loaded: usize,
    /// Malformed entries discarded.
    pub dropped: usize,
}

/// On-disk shape. Items are kept as raw values so one bad entry does not
/// fail the whole document.
#[derive(Deserialize)]
struct StoredCredentials {
    #[serde(default)]
    master: Option<String>,
    #[serde(default)]
    timestamp: u64,
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct CredentialsView<'a> {
    master: &'a str,
    timestamp: u64,
    items: &'a [Credential],
}

/// Master code plus the ordered list of temporary codes.
///
/// # Examples
///
/// ```
/// use latchkey_core::CredentialKind;
/// use latchkey_storage::models::Credential;
/// use latchkey_storage::record::MemoryRecord;
/// use latchkey_storage::repositories::{AuthDecision, CredentialStore, DenialReason};
///
/// # fn main() -> latchkey_storage::StorageResult<()> {
/// let mut store = CredentialStore::new(Box::new(MemoryRecord::new()));
/// store.add_timed_or_one_time(Credential::one_time("1357"), 0)?;
///
/// assert_eq!(
///     store.validate_and_consume("1357", 10),
///     AuthDecision::Authorized(CredentialKind::OneTime)
/// );
/// assert_eq!(
///     store.validate_and_consume("1357", 11),
///     AuthDecision::Denied(DenialReason::NoMatch)
/// );
/// # Ok(())
/// # }
/// ```
pub struct CredentialStore {
    record: Box<dyn RecordStore>,
    master: Option<String>,
    items: Vec<Credential>,
    timestamp: u64,
    dirty: bool,
    min_master_len: usize,
}

impl CredentialStore {
    /// Create an empty store over `record`. Call [`load`](Self::load) to
    /// restore the persisted state.
    pub fn new(record: Box<dyn RecordStore>) -> Self {
        Self {
            record,
            master: None,
            items: Vec::new(),
            timestamp: 0,
            dirty: false,
            min_master_len: 1,
        }
    }

    /// Shortest master code [`validate_and_consume`](Self::validate_and_consume)
    /// will accept. A loaded master shorter than this never authorizes.
    #[must_use]
    pub fn with_min_master_length(mut self, len: usize) -> Self {
        self.min_master_len = len.max(1);
        self
    }

    /// Restore the master code and the temporary list from the record.
    ///
    /// A missing record loads as empty. Individual malformed entries (empty
    /// code, unknown kind, wrong shape) are dropped and counted.
    ///
    /// # Errors
    /// Returns an error if the record cannot be read or is not a JSON
    /// object at all. The store is left empty in that case.
    pub fn load(&mut self) -> StorageResult<LoadReport> {
        self.master = None;
        self.items.clear();
        self.timestamp = 0;
        self.dirty = false;

        let Some(contents) = self.record.read()? else {
            debug!("No credential record at {}", self.record.describe());
            return Ok(LoadReport::default());
        };

        let stored: StoredCredentials = serde_json::from_str(&contents)?;

        let mut report = LoadReport::default();
        for value in stored.items {
            match serde_json::from_value::<Credential>(value) {
                Ok(entry) if entry.validate().is_ok() => {
                    self.items.push(entry);
                    report.loaded += 1;
                }
                _ => report.dropped += 1,
            }
        }

        self.master = stored.master.filter(|m| !m.is_empty());
        self.timestamp = stored.timestamp;

        if report.dropped > 0 {
            warn!(
                "Dropped {} malformed credential entries from {}",
                report.dropped,
                self.record.describe()
            );
        }
        info!(
            "Loaded {} temporary credentials (master {})",
            report.loaded,
            if self.master.is_some() { "set" } else { "unset" }
        );

        Ok(report)
    }

    /// Current master code, if one is set.
    #[must_use]
    pub fn master(&self) -> Option<&str> {
        self.master.as_deref()
    }

    #[must_use]
    pub fn has_master(&self) -> bool {
        self.master.is_some()
    }

    /// Constant-time check of `code` against the master code.
    #[must_use]
    pub fn verify_master(&self, code: &str) -> bool {
        match &self.master {
            Some(master) => secure_eq(master, code),
            None => false,
        }
    }

    /// Set or replace the master code.
    ///
    /// # Errors
    /// `Validation` if `code` is empty (nothing changes), or a persistence
    /// error if the change could not be written.
    pub fn set_master(&mut self, code: &str, now: u64) -> StorageResult<()> {
        if code.is_empty() {
            return Err(StorageError::validation("master code is empty"));
        }
        self.master = Some(code.to_string());
        info!("Master code set to {}", mask_code(code));
        self.persist(now)
    }

    /// Remove the master code. Returns `false` if none was set.
    ///
    /// # Errors
    /// Returns a persistence error if the change could not be written.
    pub fn clear_master(&mut self, now: u64) -> StorageResult<bool> {
        if self.master.take().is_none() {
            return Ok(false);
        }
        info!("Master code cleared");
        self.persist(now)?;
        Ok(true)
    }

    /// Append a one-time or timed code to the end of the list. A code that
    /// is already stored is appended again; earlier entries keep precedence.
    ///
    /// # Errors
    /// - `Validation` if the code is empty or the kind is `master`
    /// - a persistence error if the change could not be written
    pub fn add_timed_or_one_time(&mut self, entry: Credential, now: u64) -> StorageResult<()> {
        entry.validate()?;

        info!(
            "Adding {} credential {} (window {}..{})",
            entry.kind,
            entry.masked(),
            entry.effective_at,
            entry.expire_at
        );
        self.items.push(entry);
        self.persist(now)
    }

    /// Remove the first temporary credential with this code.
    ///
    /// Returns whether anything was removed. The master code is never
    /// touched here.
    ///
    /// # Errors
    /// Returns a persistence error if the removal could not be written.
    pub fn remove_by_code(&mut self, code: &str, now: u64) -> StorageResult<bool> {
        let Some(index) = self.find_index(code) else {
            return Ok(false);
        };
        let removed = self.items.remove(index);
        info!("Removed {} credential {}", removed.kind, removed.masked());
        self.persist(now)?;
        Ok(true)
    }

    /// Authenticate `code` at wall-clock second `now`.
    ///
    /// The master code is checked first, provided it is at least the
    /// minimum length. Then the first temporary entry with this code decides:
    ///
    /// - an expired match is deleted and denied
    /// - a match whose window has not started is denied
    /// - a one-time match is deleted and authorized
    /// - a timed match is authorized and kept
    ///
    /// A failed write after a deletion is logged and left for the next
    /// [`flush`](Self::flush); the decision stands.
    pub fn validate_and_consume(&mut self, code: &str, now: u64) -> AuthDecision {
        if code.is_empty() {
            return AuthDecision::Denied(DenialReason::NoMatch);
        }

        if self.verify_master(code) {
            if code.chars().count() >= self.min_master_len {
                return AuthDecision::Authorized(CredentialKind::Master);
            }
            warn!("Master code shorter than {} characters, ignored", self.min_master_len);
        }

        let Some(index) = self.find_index(code) else {
            return AuthDecision::Denied(DenialReason::NoMatch);
        };

        let entry = &self.items[index];
        if entry.is_expired(now) {
            let removed = self.items.remove(index);
            info!("Credential {} expired, removed", removed.masked());
            self.persist_logged(now);
            return AuthDecision::Denied(DenialReason::Expired);
        }

        if !entry.is_effective(now) {
            debug!(
                "Credential {} not effective until {}",
                entry.masked(),
                entry.effective_at
            );
            return AuthDecision::Denied(DenialReason::NotYetEffective);
        }

        let kind = entry.kind;
        match kind {
            CredentialKind::OneTime => {
                let used = self.items.remove(index);
                info!("One-time credential {} used, removed", used.masked());
                self.persist_logged(now);
                AuthDecision::Authorized(CredentialKind::OneTime)
            }
            kind => AuthDecision::Authorized(kind),
        }
    }

    /// Drop every temporary credential expired at `now`.
    ///
    /// Returns how many were dropped. A failed write is logged and the store
    /// stays dirty.
    pub fn sweep_expired(&mut self, now: u64) -> usize {
        let before = self.items.len();
        self.items.retain(|entry| !entry.is_expired(now));
        let dropped = before - self.items.len();

        if dropped > 0 {
            info!("Expiry sweep dropped {} credentials", dropped);
            self.persist_logged(now);
        }
        dropped
    }

    /// Temporary credentials in stored order.
    #[must_use]
    pub fn list(&self) -> &[Credential] {
        &self.items
    }

    /// Wall-clock second of the last mutation.
    #[must_use]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Returns `true` while a mutation has not been written successfully.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Retry writing an unconfirmed state. No-op when clean.
    ///
    /// # Errors
    /// Returns the write error; the store stays dirty.
    pub fn flush(&mut self) -> StorageResult<()> {
        if !self.dirty {
            return Ok(());
        }
        self.write()?;
        info!("Credential record {} flushed", self.record.describe());
        Ok(())
    }

    /// Index of the first temporary entry with `code`, comparing against
    /// every entry.
    fn find_index(&self, code: &str) -> Option<usize> {
        let mut found = None;
        for (i, entry) in self.items.iter().enumerate() {
            if secure_eq(&entry.code, code) && found.is_none() {
                found = Some(i);
            }
        }
        found
    }

    fn persist(&mut self, now: u64) -> StorageResult<()> {
        self.timestamp = now;
        self.dirty = true;
        self.write()
    }

    fn persist_logged(&mut self, now: u64) {
        if let Err(e) = self.persist(now) {
            warn!("Credential change not persisted, will retry: {}", e);
        }
    }

    fn write(&mut self) -> StorageResult<()> {
        let view = CredentialsView {
            master: self.master.as_deref().unwrap_or(""),
            timestamp: self.timestamp,
            items: &self.items,
        };
        let contents = serde_json::to_string(&view)?;
        self.record.replace(&contents)?;
        self.dirty = false;
        Ok(())
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("record", &self.record.describe())
            .field("has_master", &self.master.is_some())
            .field("items", &self.items.len())
            .field("timestamp", &self.timestamp)
            .field("dirty", &self.dirty)
            .finish()
    }
}
