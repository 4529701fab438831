//! Backing records with atomic replace semantics.
//!
//! A store keeps its whole state in one small JSON document. Every mutation
//! rewrites the document through [`RecordStore::replace`], which must never
//! leave a half-written document visible: either the previous version or
//! the new one is read back after a power loss.
//!
//! [`FileRecord`] does this with the usual write-side-file-then-rename
//! sequence. [`MemoryRecord`] keeps the document in memory and can be told
//! to fail, which is how the persistence-failure policy is tested.

use crate::error::{StorageError, StorageResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// A single persisted document.
pub trait RecordStore: Send {
    /// Read the current document. `None` when nothing has been written yet.
    ///
    /// # Errors
    /// Returns an error if the document exists but cannot be read.
    fn read(&self) -> StorageResult<Option<String>>;

    /// Atomically replace the document with `contents`.
    ///
    /// # Errors
    /// Returns an error if the new version could not be made durable. The
    /// previous version is still intact in that case.
    fn replace(&mut self, contents: &str) -> StorageResult<()>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// JSON document on the local filesystem.
///
/// # Examples
///
/// ```
/// use latchkey_storage::record::{FileRecord, RecordStore};
///
/// # fn main() -> latchkey_storage::StorageResult<()> {
/// let dir = tempfile::tempdir()?;
/// let mut record = FileRecord::new(dir.path().join("cards.json"));
///
/// assert_eq!(record.read()?, None);
/// record.replace(r#"{"items":[]}"#)?;
/// assert_eq!(record.read()?.as_deref(), Some(r#"{"items":[]}"#));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileRecord {
    path: PathBuf,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Side file written before the rename, next to the target so the
    /// rename never crosses a filesystem.
    fn side_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "record".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RecordStore for FileRecord {
    fn read(&self) -> StorageResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn replace(&mut self, contents: &str) -> StorageResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let side = self.side_path();
        {
            let mut file = fs::File::create(&side)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&side, &self.path) {
            if let Err(cleanup) = fs::remove_file(&side) {
                warn!("Failed to remove side file {}: {}", side.display(), cleanup);
            }
            return Err(StorageError::Io(e));
        }

        // Make the rename itself durable. Not every platform lets a
        // directory be opened for syncing, so a failure here is ignored.
        #[cfg(unix)]
        if let Some(parent) = self.path.parent()
            && let Ok(dir) = fs::File::open(if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            })
        {
            let _ = dir.sync_all();
        }

        debug!("Replaced record {} ({} bytes)", self.path.display(), contents.len());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory document with failure injection.
///
/// Clones share the same document, so a test can keep a clone to inspect
/// what was written or to make the next writes fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecord {
    contents: Arc<Mutex<Option<String>>>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl MemoryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing document, as if loaded from flash.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let record = Self::default();
        if let Ok(mut slot) = record.contents.lock() {
            *slot = Some(contents.into());
        }
        record
    }

    /// Make every following `replace` fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful replaces so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current document, if any.
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|slot| slot.clone())
    }
}

impl RecordStore for MemoryRecord {
    fn read(&self) -> StorageResult<Option<String>> {
        let slot = self
            .contents
            .lock()
            .map_err(|_| StorageError::Internal("memory record poisoned".into()))?;
        Ok(slot.clone())
    }

    fn replace(&mut self, contents: &str) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other(
                "simulated write failure",
            )));
        }

        let mut slot = self
            .contents
            .lock()
            .map_err(|_| StorageError::Internal("memory record poisoned".into()))?;
        *slot = Some(contents.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
