//! Typed forms of the inbound JSON payloads.
//!
//! Queued [`Command`](crate::Command)s carry raw JSON; the engine parses it
//! here before touching any state, so a malformed payload is rejected
//! without side effects.

use latchkey_core::CredentialKind;
use latchkey_storage::Credential;
use serde::Deserialize;

use crate::error::{EngineError, Result};

#[derive(Debug, Deserialize)]
struct CredentialPayload {
    action: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    code: String,
    #[serde(default)]
    old_code: Option<String>,
    #[serde(default, alias = "effectiveAt")]
    effective_at: u64,
    #[serde(default, alias = "expireAt")]
    expire_at: u64,
}

#[derive(Debug, Deserialize)]
struct CardPayload {
    action: String,
    #[serde(default, alias = "uid")]
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ControlPayload {
    action: String,
}

/// Passcode management request.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialCommand {
    /// Set the master code, or change it when `old_code` proves the current one.
    SetMaster {
        code: String,
        old_code: Option<String>,
    },
    AddTemporary(Credential),
    /// Delete the master if it matches, else the first temporary match.
    Delete { code: String },
}

impl std::fmt::Debug for CredentialCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialCommand::SetMaster { code, old_code } => f
                .debug_struct("SetMaster")
                .field("code", &latchkey_core::mask_code(code))
                .field("has_old_code", &old_code.is_some())
                .finish(),
            CredentialCommand::AddTemporary(entry) => {
                f.debug_tuple("AddTemporary").field(entry).finish()
            }
            CredentialCommand::Delete { code } => f
                .debug_struct("Delete")
                .field("code", &latchkey_core::mask_code(code))
                .finish(),
        }
    }
}

impl CredentialCommand {
    /// Parse a passcode payload.
    ///
    /// `type` is `permanent` (or `master`) for the master code, `one_time`,
    /// `timed` or the legacy `temp` (same as `one_time`) for temporary codes.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Payload` for malformed JSON, an unknown action
    /// or type, or a missing code.
    pub fn parse(payload: &str) -> Result<Self> {
        let p: CredentialPayload = serde_json::from_str(payload)?;
        if p.code.is_empty() {
            return Err(EngineError::payload("missing code"));
        }
        match p.action.as_str() {
            "add" => match p.kind.as_deref().unwrap_or("permanent") {
                "permanent" | "master" => Ok(CredentialCommand::SetMaster {
                    code: p.code,
                    old_code: p.old_code.filter(|c| !c.is_empty()),
                }),
                "one_time" | "temp" => Ok(CredentialCommand::AddTemporary(
                    Credential::one_time(p.code).with_window(p.effective_at, p.expire_at),
                )),
                "timed" => Ok(CredentialCommand::AddTemporary(Credential::timed(
                    p.code,
                    p.effective_at,
                    p.expire_at,
                ))),
                other => Err(EngineError::payload(format!("unknown passcode type '{}'", other))),
            },
            "delete" | "remove" => Ok(CredentialCommand::Delete { code: p.code }),
            other => Err(EngineError::payload(format!("unknown passcode action '{}'", other))),
        }
    }

    /// Kind of credential this command writes, `None` for deletes.
    pub fn kind(&self) -> Option<CredentialKind> {
        match self {
            CredentialCommand::SetMaster { .. } => Some(CredentialKind::Master),
            CredentialCommand::AddTemporary(entry) => Some(entry.kind),
            CredentialCommand::Delete { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardCommand {
    Add { id: String, name: Option<String> },
    Delete { id: String },
    StartSwipeAdd,
}

impl CardCommand {
    /// Parse a card payload.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Payload` for malformed JSON, an unknown action
    /// or a missing card id.
    pub fn parse(payload: &str) -> Result<Self> {
        let p: CardPayload = serde_json::from_str(payload)?;
        match p.action.as_str() {
            "start_swipe_add" => Ok(CardCommand::StartSwipeAdd),
            "add" | "delete" if p.id.trim().is_empty() => Err(EngineError::payload("missing card id")),
            "add" => Ok(CardCommand::Add {
                id: p.id,
                name: p.name.filter(|n| !n.trim().is_empty()),
            }),
            "delete" => Ok(CardCommand::Delete { id: p.id }),
            other => Err(EngineError::payload(format!("unknown card action '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Unlock,
    Lock,
}

impl ControlCommand {
    /// Parse a control payload.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Payload` for malformed JSON or an unknown action.
    pub fn parse(payload: &str) -> Result<Self> {
        let p: ControlPayload = serde_json::from_str(payload)?;
        match p.action.as_str() {
            "unlock" => Ok(ControlCommand::Unlock),
            "lock" => Ok(ControlCommand::Lock),
            other => Err(EngineError::payload(format!("unknown control action '{}'", other))),
        }
    }
}
