//! Enrolled card registry.
//!
//! Record shape:
//!
//! ```json
//! {"timestamp":1700000000,"items":[{"uid":"04ABCDEF","name":"Card1"}]}
//! ```
//!
//! Identifiers are normalized at every entry point, so callers may pass
//! reader output or `04:ab:cd:ef` style strings interchangeably. Persistence
//! follows the same keep-and-retry policy as the credential store.

use latchkey_core::CardUid;
use latchkey_core::constants::REGISTRY_CARD_NAME_PREFIX;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::LoadReport;
use crate::error::{StorageError, StorageResult};
use crate::models::CardEntry;
use crate::record::RecordStore;

#[derive(Deserialize)]
struct StoredCards {
    #[serde(default)]
    timestamp: u64,
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct CardsView<'a> {
    timestamp: u64,
    items: &'a [CardEntry],
}

/// Set of enrolled cards with display names, in enrollment order.
///
/// # Examples
///
/// ```
/// use latchkey_storage::record::MemoryRecord;
/// use latchkey_storage::repositories::CardRegistry;
///
/// # fn main() -> latchkey_storage::StorageResult<()> {
/// let mut registry = CardRegistry::new(Box::new(MemoryRecord::new()));
///
/// let entry = registry.add("04:ab:cd:ef", None, 0)?;
/// assert_eq!(entry.name, "Card1");
/// assert!(registry.exists("04ABCDEF"));
/// # Ok(())
/// # }
/// ```
pub struct CardRegistry {
    record: Box<dyn RecordStore>,
    items: Vec<CardEntry>,
    timestamp: u64,
    dirty: bool,
}

impl CardRegistry {
    pub fn new(record: Box<dyn RecordStore>) -> Self {
        Self {
            record,
            items: Vec::new(),
            timestamp: 0,
            dirty: false,
        }
    }

    /// Restore the registry from its record.
    ///
    /// Entries with an empty or malformed identifier, and repeats of an
    /// identifier already loaded, are dropped and counted.
    ///
    /// # Errors
    /// Returns an error if the record cannot be read or is not a JSON
    /// object. The registry is left empty in that case.
    pub fn load(&mut self) -> StorageResult<LoadReport> {
        self.items.clear();
        self.timestamp = 0;
        self.dirty = false;

        let Some(contents) = self.record.read()? else {
            debug!("No card record at {}", self.record.describe());
            return Ok(LoadReport::default());
        };

        let stored: StoredCards = serde_json::from_str(&contents)?;

        let mut report = LoadReport::default();
        for value in stored.items {
            match serde_json::from_value::<CardEntry>(value) {
                Ok(entry) if !self.contains(&entry.uid) => {
                    self.items.push(entry);
                    report.loaded += 1;
                }
                _ => report.dropped += 1,
            }
        }
        self.timestamp = stored.timestamp;

        if report.dropped > 0 {
            warn!(
                "Dropped {} malformed card entries from {}",
                report.dropped,
                self.record.describe()
            );
        }
        info!("Loaded {} enrolled cards", report.loaded);

        Ok(report)
    }

    /// Enroll a card.
    ///
    /// Without a name (or with a blank one) the card is called
    /// `Card<N+1>`, where `N` is the number of cards before this one.
    ///
    /// # Errors
    /// - `Validation` if the identifier is empty or malformed
    /// - `Duplicate` if the card is already enrolled
    /// - a persistence error if the change could not be written
    pub fn add(&mut self, uid: &str, name: Option<&str>, now: u64) -> StorageResult<CardEntry> {
        let uid = CardUid::new(uid)?;
        if self.contains(&uid) {
            return Err(StorageError::duplicate(uid.as_str()));
        }

        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{REGISTRY_CARD_NAME_PREFIX}{}", self.items.len() + 1),
        };

        let entry = CardEntry::new(uid, name);
        info!("Enrolling card {} as '{}'", entry.uid, entry.name);
        self.items.push(entry.clone());
        self.persist(now)?;
        Ok(entry)
    }

    /// Remove a card. Returns `false` if it was not enrolled.
    ///
    /// # Errors
    /// `Validation` for a malformed identifier, or a persistence error.
    pub fn remove(&mut self, uid: &str, now: u64) -> StorageResult<bool> {
        let uid = CardUid::new(uid)?;
        let Some(index) = self.items.iter().position(|e| e.uid == uid) else {
            return Ok(false);
        };
        let removed = self.items.remove(index);
        info!("Removed card {} ('{}')", removed.uid, removed.name);
        self.persist(now)?;
        Ok(true)
    }

    /// Change the display name of an enrolled card. Returns `false` if the
    /// card is not enrolled.
    ///
    /// # Errors
    /// `Validation` for a malformed identifier or a blank name, or a
    /// persistence error.
    pub fn rename(&mut self, uid: &str, name: &str, now: u64) -> StorageResult<bool> {
        let uid = CardUid::new(uid)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::validation("card name is empty"));
        }
        let Some(entry) = self.items.iter_mut().find(|e| e.uid == uid) else {
            return Ok(false);
        };
        entry.name = name.to_string();
        self.persist(now)?;
        Ok(true)
    }

    /// Returns `true` if the identifier is enrolled. Malformed identifiers
    /// are never enrolled.
    #[must_use]
    pub fn exists(&self, uid: &str) -> bool {
        CardUid::new(uid).is_ok_and(|uid| self.contains(&uid))
    }

    /// Returns `true` if the already-normalized identifier is enrolled.
    #[must_use]
    pub fn contains(&self, uid: &CardUid) -> bool {
        self.items.iter().any(|e| e.uid == *uid)
    }

    /// Enrolled cards in enrollment order.
    #[must_use]
    pub fn list(&self) -> &[CardEntry] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Retry writing an unconfirmed state. No-op when clean.
    ///
    /// # Errors
    /// Returns the write error; the registry stays dirty.
    pub fn flush(&mut self) -> StorageResult<()> {
        if !self.dirty {
            return Ok(());
        }
        self.write()?;
        info!("Card record {} flushed", self.record.describe());
        Ok(())
    }

    fn persist(&mut self, now: u64) -> StorageResult<()> {
        self.timestamp = now;
        self.dirty = true;
        self.write()
    }

    fn write(&mut self) -> StorageResult<()> {
        let view = CardsView {
            timestamp: self.timestamp,
            items: &self.items,
        };
        let contents = serde_json::to_string(&view)?;
        self.record.replace(&contents)?;
        self.dirty = false;
        Ok(())
    }
}

impl std::fmt::Debug for CardRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardRegistry")
            .field("record", &self.record.describe())
            .field("items", &self.items.len())
            .field("timestamp", &self.timestamp)
            .field("dirty", &self.dirty)
            .finish()
    }
}
