//! Lock state machine.
//!
//! The lock is either `Locked` or `Unlocked`; the relock deadline only exists
//! while unlocked, so it is carried by the `Unlocked` variant.
//!
//! # Transitions
//!
//! - Locked → Unlocked on an accepted credential or a remote unlock
//! - Unlocked → Unlocked when unlocked again (the deadline moves)
//! - Unlocked → Locked on auto-relock, door closing or a remote lock
//! - Locked → Locked on a remote lock (republished, nothing moves)
//!
//! Every transition is recorded with its reason in a bounded history.
//!
//! # Examples
//!
//! ```
//! use latchkey_core::{LockReason, LockStatus};
//! use latchkey_engine::LockStateMachine;
//!
//! let mut lock = LockStateMachine::new();
//! lock.unlock(5_000, LockReason::Pin, 1_000);
//!
//! assert_eq!(lock.status(), LockStatus::Unlocked);
//! assert!(!lock.should_auto_relock(5_999));
//! assert!(lock.should_auto_relock(6_000));
//! ```

use std::collections::VecDeque;
use std::fmt;

use latchkey_core::clock::{deadline_reached, remaining_ms};
use latchkey_core::{LockReason, LockStatus};
use serde::{Deserialize, Serialize};

/// Maximum number of lock transitions kept in history.
///
/// A transition is a few dozen bytes; 32 covers well over the last dozen
/// unlock/relock cycles.
const MAX_HISTORY_SIZE: usize = 32;

/// Current state of the lock mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LockState {
    Locked,

    /// Open until the monotonic time `relock_at` (milliseconds).
    Unlocked { relock_at: u64 },
}

impl LockState {
    pub fn status(&self) -> LockStatus {
        match self {
            LockState::Locked => LockStatus::Locked,
            LockState::Unlocked { .. } => LockStatus::Unlocked,
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockState::Locked => write!(f, "Locked"),
            LockState::Unlocked { relock_at } => write!(f, "Unlocked(until {}ms)", relock_at),
        }
    }
}

/// A recorded lock transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockTransition {
    /// Status before the transition.
    pub from: LockStatus,

    /// Status after the transition.
    pub to: LockStatus,

    /// What caused it.
    pub reason: LockReason,

    /// Monotonic time of the transition in milliseconds.
    pub at_ms: u64,
}

impl LockTransition {
    pub fn new(from: LockStatus, to: LockStatus, reason: LockReason, at_ms: u64) -> Self {
        Self {
            from,
            to,
            reason,
            at_ms,
        }
    }

    /// Returns `true` if the status actually changed.
    pub fn is_change(&self) -> bool {
        self.from != self.to
    }
}

/// Lock state with auto-relock timing and transition history.
///
/// The machine never reads a clock: every operation takes the current
/// monotonic time.
#[derive(Debug, Clone)]
pub struct LockStateMachine {
    state: LockState,

    /// History of transitions (limited to MAX_HISTORY_SIZE).
    history: VecDeque<LockTransition>,
}

impl LockStateMachine {
    /// Create a locked machine with an empty history.
    pub fn new() -> Self {
        Self {
            state: LockState::Locked,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn status(&self) -> LockStatus {
        self.state.status()
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.state, LockState::Locked)
    }

    /// Relock deadline, `None` while locked.
    pub fn relock_at(&self) -> Option<u64> {
        match self.state {
            LockState::Locked => None,
            LockState::Unlocked { relock_at } => Some(relock_at),
        }
    }

    /// Open the lock until `now + duration_ms`.
    ///
    /// Unlocking an open lock moves the deadline.
    ///
    /// # Returns
    ///
    /// Returns the recorded transition.
    pub fn unlock(&mut self, duration_ms: u64, reason: LockReason, now: u64) -> LockTransition {
        self.change(
            LockState::Unlocked {
                relock_at: now.saturating_add(duration_ms),
            },
            reason,
            now,
        )
    }

    /// Close the lock.
    ///
    /// # Returns
    ///
    /// Returns the recorded transition; `is_change()` is false if the lock
    /// was already closed.
    pub fn lock(&mut self, reason: LockReason, now: u64) -> LockTransition {
        self.change(LockState::Locked, reason, now)
    }

    /// Move the relock deadline to `now + delay_ms`.
    ///
    /// # Returns
    ///
    /// Returns `false` and does nothing while locked.
    pub fn rearm_auto_relock(&mut self, delay_ms: u64, now: u64) -> bool {
        match &mut self.state {
            LockState::Locked => false,
            LockState::Unlocked { relock_at } => {
                *relock_at = now.saturating_add(delay_ms);
                true
            }
        }
    }

    /// Returns `true` once an open lock has reached its relock deadline.
    pub fn should_auto_relock(&self, now: u64) -> bool {
        self.relock_at()
            .is_some_and(|relock_at| deadline_reached(now, relock_at))
    }

    /// Whole seconds until the relock deadline, rounded up. Zero while locked.
    pub fn remaining_unlock_secs(&self, now: u64) -> u64 {
        self.relock_at()
            .map_or(0, |relock_at| remaining_ms(now, relock_at).div_ceil(1000))
    }

    /// Get the last `count` transitions, most recent first.
    pub fn last_transitions(&self, count: usize) -> Vec<LockTransition> {
        self.history.iter().rev().take(count).copied().collect()
    }

    fn change(&mut self, new_state: LockState, reason: LockReason, now: u64) -> LockTransition {
        let transition = LockTransition::new(self.state.status(), new_state.status(), reason, now);
        self.state = new_state;
        self.add_to_history(transition);
        transition
    }

    fn add_to_history(&mut self, transition: LockTransition) {
        if self.history.len() >= MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(transition);
    }
}

impl Default for LockStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
