use thiserror::Error;

/// Storage-specific error types for the latchkey persistence layer.
///
/// Errors fall in two groups, and callers treat them differently:
///
/// - **rejections** ([`Validation`](StorageError::Validation),
///   [`Duplicate`](StorageError::Duplicate)) leave the in-memory state
///   untouched;
/// - **persistence failures** ([`Io`](StorageError::Io),
///   [`Serialization`](StorageError::Serialization),
///   [`Internal`](StorageError::Internal)) mean the in-memory change was
///   applied but is not yet on disk. The store stays dirty and the next
///   flush retries the write.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or replacing the backing record failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Input rejected before any change was made
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entry with the same key already exists
    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a duplicate-entry error
    pub fn duplicate(key: impl Into<String>) -> Self {
        Self::Duplicate(key.into())
    }

    /// Returns `true` if the operation was refused and nothing changed.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Duplicate(_))
    }
}

impl From<latchkey_core::Error> for StorageError {
    fn from(err: latchkey_core::Error) -> Self {
        StorageError::Validation(err.to_string())
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
