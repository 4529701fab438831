//! Persistence layer for the latchkey lock firmware.
//!
//! This crate owns the two durable stores of the lock: the PIN credentials
//! and the enrolled cards. Each store keeps its state in memory and mirrors
//! it to a single JSON record after every change.
//!
//! # Architecture
//!
//! - [`RecordStore`] - one persisted document with atomic replace
//!   ([`FileRecord`] on disk, [`MemoryRecord`] for tests and simulation)
//! - [`CredentialStore`] - master code plus one-time and timed codes
//! - [`CardRegistry`] - enrolled card identifiers with display names
//!
//! # Core Concepts
//!
//! ## Atomic replace
//!
//! A record is never edited in place. The new version is written to a side
//! file, synced, and renamed over the old one, so a power loss leaves
//! either the old or the new version behind.
//!
//! ## Keep and retry
//!
//! When a write fails, the store keeps the in-memory change, marks itself
//! dirty and returns the error. [`StorageError::is_rejection`] tells such
//! "unconfirmed" failures apart from refused input. Calling `flush()`
//! retries the write.
//!
//! ## Tolerant loading
//!
//! Malformed entries in a record are dropped on load instead of failing the
//! whole store; the [`LoadReport`] says how many were discarded.
//!
//! # Examples
//!
//! ```no_run
//! use latchkey_storage::{CardRegistry, CredentialStore, FileRecord};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut credentials = CredentialStore::new(Box::new(FileRecord::new("data/passcodes.json")));
//! let mut cards = CardRegistry::new(Box::new(FileRecord::new("data/cards.json")));
//!
//! let report = credentials.load()?;
//! cards.load()?;
//!
//! println!("{} temporary codes, {} cards", report.loaded, cards.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Security Considerations
//!
//! Codes and card identifiers are compared in constant time using the
//! `subtle` crate (through [`latchkey_core::secure_eq`]). Codes only appear
//! masked in logs.

pub mod error;
pub mod models;
pub mod record;
pub mod repositories;

pub use error::{StorageError, StorageResult};
pub use models::{CardEntry, Credential, ValidityWindow, WindowStatus};
pub use record::{FileRecord, MemoryRecord, RecordStore};
pub use repositories::{AuthDecision, CardRegistry, CredentialStore, DenialReason, LoadReport};
