//! Configuration records.
//!
//! [`LockConfig`] holds site policy (timers, PIN rules, reader timing) and is
//! read once at startup. [`NetworkConfig`] is the provisioning record the
//! transport layer uses; the engine only validates it before handing it on.
//!
//! Both are JSON. Every field is optional on disk and falls back to its
//! default, so an older file keeps loading after new fields are added.

use crate::constants::*;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lock policy and timing.
///
/// # Examples
///
/// ```
/// use latchkey_core::LockConfig;
///
/// let config = LockConfig::from_json_str(r#"{"auto_relock_delay_ms": 0}"#).unwrap();
/// assert_eq!(config.auto_relock_delay_ms, 0);
/// assert_eq!(config.max_failed_attempts, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub unlock_duration_ms: u64,
    pub auto_relock_delay_ms: u64,

    pub max_failed_attempts: u32,
    pub lockout_duration_ms: u64,
    pub min_pin_length: usize,
    pub max_pin_length: usize,

    pub rfid_debounce_ms: u64,
    pub swipe_add_timeout_ms: u64,

    pub contact_debounce_ms: u64,
    pub sync_interval_ms: u64,
    pub command_queue_capacity: usize,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            unlock_duration_ms: DEFAULT_UNLOCK_DURATION_MS,
            auto_relock_delay_ms: DEFAULT_AUTO_RELOCK_DELAY_MS,
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            lockout_duration_ms: DEFAULT_LOCKOUT_DURATION_MS,
            min_pin_length: DEFAULT_MIN_PIN_LENGTH,
            max_pin_length: DEFAULT_MAX_PIN_LENGTH,
            rfid_debounce_ms: DEFAULT_RFID_DEBOUNCE_MS,
            swipe_add_timeout_ms: DEFAULT_SWIPE_ADD_TIMEOUT_MS,
            contact_debounce_ms: DEFAULT_CONTACT_DEBOUNCE_MS,
            sync_interval_ms: DEFAULT_SYNC_INTERVAL_MS,
            command_queue_capacity: DEFAULT_COMMAND_QUEUE_CAPACITY,
        }
    }
}

impl LockConfig {
    /// Parse and validate a configuration document.
    ///
    /// # Errors
    /// Returns `Error::Json` on malformed JSON and `Error::Config` if the
    /// values are inconsistent (see [`validate`](Self::validate)).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration file, or the defaults when it does not exist.
    ///
    /// The flag is `true` when the file was found.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<(Self, bool)> {
        match std::fs::read_to_string(path) {
            Ok(json) => Ok((Self::from_json_str(&json)?, true)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok((Self::default(), false)),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Check cross-field consistency.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.min_pin_length == 0 {
            return Err(Error::Config("min_pin_length must be at least 1".into()));
        }
        if self.min_pin_length > self.max_pin_length {
            return Err(Error::Config(format!(
                "min_pin_length ({}) exceeds max_pin_length ({})",
                self.min_pin_length, self.max_pin_length
            )));
        }
        if self.max_failed_attempts == 0 {
            return Err(Error::Config(
                "max_failed_attempts must be at least 1".into(),
            ));
        }
        if self.command_queue_capacity == 0 {
            return Err(Error::Config(
                "command_queue_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Returns `true` if `code` has an acceptable PIN length.
    #[must_use]
    pub fn pin_length_ok(&self, code: &str) -> bool {
        (self.min_pin_length..=self.max_pin_length).contains(&code.chars().count())
    }
}

/// Provisioning record for the network link.
///
/// The passwords are read from JSON but never written back out, and
/// `Debug` redacts them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub wifi_ssid: String,
    #[serde(skip_serializing)]
    pub wifi_pass: String,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_user: String,
    #[serde(skip_serializing)]
    pub mqtt_pass: String,
    pub topic_prefix: String,
}

impl std::fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redacted(secret: &str) -> &'static str {
            if secret.is_empty() { "" } else { "<redacted>" }
        }
        f.debug_struct("NetworkConfig")
            .field("wifi_ssid", &self.wifi_ssid)
            .field("wifi_pass", &redacted(&self.wifi_pass))
            .field("mqtt_host", &self.mqtt_host)
            .field("mqtt_port", &self.mqtt_port)
            .field("mqtt_user", &self.mqtt_user)
            .field("mqtt_pass", &redacted(&self.mqtt_pass))
            .field("topic_prefix", &self.topic_prefix)
            .finish()
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: String::new(),
            wifi_pass: String::new(),
            mqtt_host: String::new(),
            mqtt_port: DEFAULT_MQTT_PORT,
            mqtt_user: String::new(),
            mqtt_pass: String::new(),
            topic_prefix: String::new(),
        }
    }
}

impl NetworkConfig {
    /// Parse a provisioning payload and reject incomplete records.
    ///
    /// # Errors
    /// Returns `Error::Json` on malformed JSON, `Error::MissingConfig` when
    /// the Wi-Fi or broker settings are absent.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        if !config.has_wifi() {
            return Err(Error::MissingConfig("wifi_ssid".into()));
        }
        if !config.has_mqtt() {
            return Err(Error::MissingConfig("mqtt_host".into()));
        }
        Ok(config)
    }

    #[must_use]
    pub fn has_wifi(&self) -> bool {
        !self.wifi_ssid.is_empty()
    }

    #[must_use]
    pub fn has_mqtt(&self) -> bool {
        !self.mqtt_host.is_empty() && self.mqtt_port > 0
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.has_wifi() && self.has_mqtt()
    }
}
