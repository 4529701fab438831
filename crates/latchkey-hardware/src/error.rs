//! Errors reported by lock peripherals.
//!
//! The card scanner retries [`HardwareError::is_retryable`] errors on the
//! next attempt and counts every other reader error as a failed read.

pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is gone, or the channel feeding a mock was closed.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// More than one card answered the anticollision loop.
    #[error("Card collision")]
    Collision,

    #[error("Card read error: {message}")]
    CardReadError { message: String },

    /// The device returned something outside its contract (bad UID length,
    /// unknown key).
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Lock actuator or indicator could not be driven.
    #[error("Actuator error: {message}")]
    ActuatorError { message: String },

    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn card_read(message: impl Into<String>) -> Self {
        Self::CardReadError {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn actuator(message: impl Into<String>) -> Self {
        Self::ActuatorError {
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Returns `true` if the same read may succeed on the next attempt
    /// without counting as a failure.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Collision)
    }
}
