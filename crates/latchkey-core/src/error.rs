use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown credential kind: {0}")]
    UnknownCredentialKind(String),

    // Card errors
    #[error("Invalid card UID: {0}")]
    InvalidCardUid(String),

    // Lock errors
    #[error("Unknown lock reason: {0}")]
    UnknownLockReason(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
