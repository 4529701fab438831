//! Clock primitives.
//!
//! Two time sources are used by the firmware and they are deliberately kept
//! apart:
//!
//! - a **monotonic millisecond counter** for every timer (relock, lockout,
//!   scan phases, debounce). It never goes backwards.
//! - a **best-effort wall clock** in Unix seconds, used only for credential
//!   validity windows and record timestamps. It may be wrong until the
//!   network has set the time, and may jump.
//!
//! State machines take `now` as an argument instead of reading a clock, so
//! they can be tested without one. Only the orchestrator holds a [`Clock`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Source of both time bases.
pub trait Clock: Send + Sync {
    /// Monotonic milliseconds since an arbitrary origin.
    fn now_ms(&self) -> u64;

    /// Wall-clock Unix seconds. `0` when the time is not known.
    fn now_secs(&self) -> u64;
}

/// Returns `true` once `now` has reached `deadline`.
#[inline]
#[must_use]
pub fn deadline_reached(now: u64, deadline: u64) -> bool {
    now >= deadline
}

/// Milliseconds left until `deadline`, zero once it has passed.
#[inline]
#[must_use]
pub fn remaining_ms(now: u64, deadline: u64) -> u64 {
    deadline.saturating_sub(now)
}

/// Production clock backed by [`Instant`] and the system time.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn now_secs(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
    }
}

/// Manually driven clock for tests and simulations.
///
/// Clones share the same time, so a test can keep one handle and give the
/// other to the engine.
///
/// # Examples
///
/// ```
/// use latchkey_core::{Clock, ManualClock};
///
/// let clock = ManualClock::new(1_700_000_000);
/// let engine_view = clock.clone();
///
/// clock.advance_ms(1_500);
/// assert_eq!(engine_view.now_ms(), 1_500);
/// assert_eq!(engine_view.now_secs(), 1_700_000_001);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    ms: Arc<AtomicU64>,
    base_secs: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock at monotonic zero and the given wall-clock second.
    pub fn new(wall_secs: u64) -> Self {
        Self {
            ms: Arc::new(AtomicU64::new(0)),
            base_secs: Arc::new(AtomicU64::new(wall_secs)),
        }
    }

    /// Move both time bases forward.
    pub fn advance_ms(&self, delta: u64) {
        self.ms.fetch_add(delta, Ordering::SeqCst);
    }

    /// Set the wall clock without touching the monotonic counter, as an NTP
    /// sync would.
    pub fn set_wall_secs(&self, secs: u64) {
        let elapsed = self.ms.load(Ordering::SeqCst) / 1000;
        self.base_secs
            .store(secs.saturating_sub(elapsed), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.ms.load(Ordering::SeqCst)
    }

    fn now_secs(&self) -> u64 {
        self.base_secs.load(Ordering::SeqCst) + self.ms.load(Ordering::SeqCst) / 1000
    }
}
