//! Outbound notifications.
//!
//! The engine never talks to a transport directly. Everything it has to say
//! goes through an [`EventSink`] as an [`EngineEvent`]; the transport (MQTT,
//! the simulator's stdout) decides topics and framing. Events serialize to
//! JSON with a `type` tag.

use std::sync::{Arc, Mutex, MutexGuard};

use latchkey_core::{CredentialKind, LockReason, LockStatus, NetworkConfig, mask_code};
use latchkey_storage::{CardEntry, Credential, ValidityWindow, WindowStatus};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

/// A credential as published: the code is always masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialSummary {
    pub code: String,
    pub kind: CredentialKind,
    pub effective_at: u64,
    pub expire_at: u64,
    pub status: WindowStatus,
}

impl CredentialSummary {
    pub fn master(code: &str) -> Self {
        Self {
            code: mask_code(code),
            kind: CredentialKind::Master,
            effective_at: 0,
            expire_at: 0,
            status: WindowStatus::Active,
        }
    }

    pub fn from_credential(credential: &Credential, now_secs: u64) -> Self {
        Self {
            code: credential.masked(),
            kind: credential.kind,
            effective_at: credential.effective_at,
            expire_at: credential.expire_at,
            status: credential.status(now_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardSummary {
    pub uid: String,
    pub name: String,
}

impl From<&CardEntry> for CardSummary {
    fn from(entry: &CardEntry) -> Self {
        Self {
            uid: entry.uid.to_string(),
            name: entry.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    LockState {
        state: LockStatus,
        reason: LockReason,
    },
    CredentialList {
        entries: Vec<CredentialSummary>,
    },
    CardList {
        cards: Vec<CardSummary>,
    },
    Log {
        event: String,
        method: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    EnrollStatus {
        status: String,
    },
    PasscodeError {
        error: String,
    },
    NetworkConfig {
        config: NetworkConfig,
    },
}

impl EngineEvent {
    pub fn log(event: impl Into<String>, method: impl Into<String>) -> Self {
        EngineEvent::Log {
            event: event.into(),
            method: method.into(),
            detail: None,
        }
    }

    pub fn log_with(
        event: impl Into<String>,
        method: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        EngineEvent::Log {
            event: event.into(),
            method: method.into(),
            detail: Some(detail.into()),
        }
    }

    /// Name of a `Log` event, `None` for other variants.
    pub fn log_name(&self) -> Option<&str> {
        match self {
            EngineEvent::Log { event, .. } => Some(event),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Destination of engine events. Must not block.
pub trait EventSink: Send {
    fn publish(&mut self, event: EngineEvent);
}

impl EventSink for Box<dyn EventSink> {
    fn publish(&mut self, event: EngineEvent) {
        (**self).publish(event);
    }
}

/// Forwards events to a bounded channel, dropping them when it is full.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelSink {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn publish(&mut self, event: EngineEvent) {
        if let Err(e) = self.tx.try_send(event) {
            warn!(error = %e, "Event dropped");
        }
    }
}

/// Keeps every event in memory. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<EngineEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.lock().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<EngineEvent> {
        std::mem::take(&mut *self.lock())
    }

    /// Names of the recorded `Log` events, in order.
    pub fn log_names(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| e.log_name().map(str::to_string))
            .collect()
    }

    pub fn last(&self) -> Option<EngineEvent> {
        self.lock().last().cloned()
    }
}

impl EventSink for RecordingSink {
    fn publish(&mut self, event: EngineEvent) {
        self.lock().push(event);
    }
}
