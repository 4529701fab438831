use latchkey_hardware::HardwareError;
use latchkey_storage::StorageError;
use thiserror::Error;

use crate::queue::QueueError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("Command queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Configuration error: {0}")]
    Config(#[from] latchkey_core::Error),

    /// Inbound payload that could not be understood.
    #[error("Malformed payload: {0}")]
    Payload(String),
}

impl EngineError {
    pub fn payload(msg: impl Into<String>) -> Self {
        Self::Payload(msg.into())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Payload(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
