//! Default timing and policy constants for the lock firmware.
//!
//! Every value here is the default used when a field is missing from the
//! lock configuration record (see [`LockConfig`](crate::config::LockConfig)).
//! The scan-cycle constants are fixed and not configurable: they describe
//! the reader hardware, not site policy.
//!
//! # Usage
//!
//! ```
//! use latchkey_core::constants::*;
//!
//! assert!(DEFAULT_MIN_PIN_LENGTH <= DEFAULT_MAX_PIN_LENGTH);
//! assert_eq!(SCAN_POLL_INTERVAL_MS, 30);
//! ```

// ============================================================================
// Lock Timing
// ============================================================================

/// How long a successful authentication keeps the lock open before the
/// auto-relock timer fires.
pub const DEFAULT_UNLOCK_DURATION_MS: u64 = 5_000;

/// Grace period between the door closing and the lock re-engaging.
///
/// A value of zero locks immediately when the door closes.
pub const DEFAULT_AUTO_RELOCK_DELAY_MS: u64 = 15_000;

/// Period of the indicator LED blink while the lock is open.
pub const INDICATOR_BLINK_PERIOD_MS: u64 = 1_000;

// ============================================================================
// PIN Policy
// ============================================================================

/// Consecutive failed PIN submissions before the keypad locks out.
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;

/// Length of the keypad lockout window.
pub const DEFAULT_LOCKOUT_DURATION_MS: u64 = 30_000;

/// Shortest PIN accepted on submit. Shorter submissions count as failures.
pub const DEFAULT_MIN_PIN_LENGTH: usize = 4;

/// Longest PIN the keypad buffer will hold.
pub const DEFAULT_MAX_PIN_LENGTH: usize = 10;

// ============================================================================
// Card Reader
// ============================================================================

/// Idle period after a successful read before a new scan cycle may start.
pub const DEFAULT_RFID_DEBOUNCE_MS: u64 = 2_000;

/// Time allowed between the two presentations of swipe enrollment.
pub const DEFAULT_SWIPE_ADD_TIMEOUT_MS: u64 = 60_000;

/// Cadence of the coalesced card-scan cycle.
pub const SCAN_POLL_INTERVAL_MS: u64 = 30;

/// Minimum spacing between two read attempts while a card is present.
pub const SCAN_ATTEMPT_INTERVAL_MS: u64 = 30;

/// How long presence may drop out before the card counts as removed.
pub const SCAN_REMOVE_GRACE_MS: u64 = 400;

/// Consecutive read failures between two reader reinitializations.
pub const SCAN_REINIT_EVERY_FAILS: u32 = 25;

// ============================================================================
// Door Contact
// ============================================================================

/// Time the raw contact reading must hold steady before it is accepted.
pub const DEFAULT_CONTACT_DEBOUNCE_MS: u64 = 80;

// ============================================================================
// Command Queue
// ============================================================================

/// Capacity of the asynchronous command inbox.
pub const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 20;

/// Upper bound on how long a producer waits for the queue lock.
pub const COMMAND_QUEUE_LOCK_TIMEOUT_MS: u64 = 100;

// ============================================================================
// Housekeeping
// ============================================================================

/// Interval between two re-publications of the credential list.
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 300_000;

/// Interval of the expiry sweep over temporary credentials.
pub const EXPIRY_SWEEP_INTERVAL_MS: u64 = 1_000;

/// Default MQTT port of the provisioning record (TLS).
pub const DEFAULT_MQTT_PORT: u16 = 8883;

// ============================================================================
// Naming
// ============================================================================

/// Prefix of the name generated by the card registry when none is given.
pub const REGISTRY_CARD_NAME_PREFIX: &str = "Card";

/// Prefix of the name given to cards enrolled remotely or by swipe.
pub const ENROLLED_CARD_NAME_PREFIX: &str = "ICCard";
