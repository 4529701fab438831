//! Command inbox between asynchronous producers and the control loop.
//!
//! Producers (network handlers, provisioning, the simulator's stdin task)
//! hold a [`CommandSender`]; the control loop owns the [`CommandQueue`] and
//! drains it once per iteration without ever waiting. The lock is held only
//! for a push or a drain.
//!
//! # Examples
//!
//! ```
//! use latchkey_engine::{Command, CommandKind, CommandQueue};
//!
//! let queue = CommandQueue::new(2);
//! let sender = queue.sender();
//!
//! sender.try_send(Command::new(CommandKind::Control, "mqtt", r#"{"action":"unlock"}"#)).unwrap();
//! sender.try_send(Command::new(CommandKind::SyncCards, "mqtt", "")).unwrap();
//! assert!(sender.try_send(Command::new(CommandKind::SyncCards, "mqtt", "")).is_err());
//!
//! let drained = queue.drain();
//! assert_eq!(drained.len(), 2);
//! assert_eq!(drained[0].kind, CommandKind::Control);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use latchkey_core::constants::COMMAND_QUEUE_LOCK_TIMEOUT_MS;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// What a queued command asks the control loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Validate and hand out a provisioning record.
    ApplyNetworkConfig,
    /// Set, change or delete a passcode.
    Credential,
    /// Add or delete a card, or start swipe enrollment.
    Card,
    /// Remote lock or unlock.
    Control,
    /// Republish the credential list.
    SyncCredentials,
    /// Republish the card list.
    SyncCards,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::ApplyNetworkConfig => "apply_network_config",
            CommandKind::Credential => "credential",
            CommandKind::Card => "card",
            CommandKind::Control => "control",
            CommandKind::SyncCredentials => "sync_credentials",
            CommandKind::SyncCards => "sync_cards",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CommandKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apply_network_config" | "network" => Ok(CommandKind::ApplyNetworkConfig),
            "credential" | "passcode" => Ok(CommandKind::Credential),
            "card" => Ok(CommandKind::Card),
            "control" => Ok(CommandKind::Control),
            "sync_credentials" => Ok(CommandKind::SyncCredentials),
            "sync_cards" => Ok(CommandKind::SyncCards),
            other => Err(format!("unknown command kind '{}'", other)),
        }
    }
}

/// A queued request with its raw JSON payload.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub kind: CommandKind,

    /// Who sent it (`mqtt`, `stdin`, ...). Used as the log method tag.
    pub source: String,

    pub payload: String,
}

impl Command {
    pub fn new(kind: CommandKind, source: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            payload: payload.into(),
        }
    }
}

impl fmt::Debug for Command {
    // Payloads carry passcodes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("kind", &self.kind)
            .field("source", &self.source)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Command queue full (capacity {capacity})")]
    Full { capacity: usize },

    #[error("Command queue lock not acquired within {timeout_ms}ms")]
    Busy { timeout_ms: u64 },
}

#[derive(Debug)]
struct Shared {
    items: Mutex<VecDeque<Command>>,
    capacity: usize,
}

impl Shared {
    fn push(&self, items: &mut VecDeque<Command>, command: Command) -> Result<(), QueueError> {
        if items.len() >= self.capacity {
            warn!(kind = %command.kind, source = %command.source, "Command queue full, dropping command");
            return Err(QueueError::Full {
                capacity: self.capacity,
            });
        }
        debug!(kind = %command.kind, source = %command.source, "Command queued");
        items.push_back(command);
        Ok(())
    }
}

/// Bounded FIFO owned by the control loop.
#[derive(Debug)]
pub struct CommandQueue {
    shared: Arc<Shared>,
}

impl CommandQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                items: Mutex::new(VecDeque::with_capacity(capacity)),
                capacity,
            }),
        }
    }

    /// Handle for producers. Clones share this queue.
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Enqueue without waiting.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Full` at capacity, `QueueError::Busy` if a
    /// producer holds the lock.
    pub fn try_enqueue(&self, command: Command) -> Result<(), QueueError> {
        self.sender().try_send(command)
    }

    /// Pop the oldest command, `None` if empty or the lock is taken.
    pub fn dequeue(&self) -> Option<Command> {
        self.shared.items.try_lock().ok()?.pop_front()
    }

    /// Take every command queued right now, oldest first.
    ///
    /// Commands pushed after this call wait for the next one. Returns an
    /// empty list if a producer holds the lock.
    pub fn drain(&self) -> Vec<Command> {
        match self.shared.items.try_lock() {
            Ok(mut items) => items.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Number of queued commands, zero if the lock is taken.
    pub fn len(&self) -> usize {
        self.shared.items.try_lock().map_or(0, |items| items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut items) = self.shared.items.try_lock() {
            items.clear();
        }
    }
}

/// Cloneable producer handle.
#[derive(Debug, Clone)]
pub struct CommandSender {
    shared: Arc<Shared>,
}

impl CommandSender {
    /// Enqueue, waiting at most 100 ms for the lock.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Full` at capacity, `QueueError::Busy` if the
    /// lock could not be taken in time. Callers treat both as "command
    /// dropped".
    pub async fn send(&self, command: Command) -> Result<(), QueueError> {
        let timeout = Duration::from_millis(COMMAND_QUEUE_LOCK_TIMEOUT_MS);
        let mut items = tokio::time::timeout(timeout, self.shared.items.lock())
            .await
            .map_err(|_| QueueError::Busy {
                timeout_ms: COMMAND_QUEUE_LOCK_TIMEOUT_MS,
            })?;
        self.shared.push(&mut items, command)
    }

    /// Enqueue without waiting, for producers outside an async context.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send), but fails immediately if the lock is
    /// taken.
    pub fn try_send(&self, command: Command) -> Result<(), QueueError> {
        let mut items = self.shared.items.try_lock().map_err(|_| QueueError::Busy {
            timeout_ms: 0,
        })?;
        self.shared.push(&mut items, command)
    }
}
