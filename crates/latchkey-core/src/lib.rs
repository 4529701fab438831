//! Core types shared by every latchkey crate.
//!
//! This crate is the leaf of the workspace: it owns the error type, the
//! value types that cross crate boundaries (card identifiers, lock reasons,
//! credential kinds), the clock primitives every state machine consumes, and
//! the configuration records loaded at startup.

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LockConfig, NetworkConfig};
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
