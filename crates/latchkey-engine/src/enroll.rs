//! Swipe enrollment: a new card is added by presenting it twice.

use latchkey_core::CardUid;
use latchkey_core::clock::{deadline_reached, remaining_ms};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SwipeEnroll {
    #[default]
    Inactive,
    AwaitingFirst {
        deadline: u64,
    },
    AwaitingSecond {
        first: CardUid,
        deadline: u64,
    },
}

/// Result of feeding a swipe into an active enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollStep {
    /// First presentation recorded, waiting for the confirmation swipe.
    FirstSwipe(CardUid),
    /// The same card was presented twice. Enrollment is over.
    Confirmed(CardUid),
    /// A different card was presented. Enrollment is over.
    Mismatch { first: CardUid, second: CardUid },
    /// The swipe came after the deadline. Enrollment is over.
    TimedOut,
}

impl SwipeEnroll {
    /// Start (or restart) enrollment with a fresh deadline.
    pub fn start(&mut self, timeout_ms: u64, now: u64) {
        *self = SwipeEnroll::AwaitingFirst {
            deadline: now.saturating_add(timeout_ms),
        };
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, SwipeEnroll::Inactive)
    }

    pub fn cancel(&mut self) {
        *self = SwipeEnroll::Inactive;
    }

    fn deadline(&self) -> Option<u64> {
        match self {
            SwipeEnroll::Inactive => None,
            SwipeEnroll::AwaitingFirst { deadline } | SwipeEnroll::AwaitingSecond { deadline, .. } => {
                Some(*deadline)
            }
        }
    }

    /// Feed a card read.
    ///
    /// The first swipe re-arms the deadline for the second one.
    ///
    /// # Returns
    ///
    /// Returns `None` when enrollment is not active; the read is then a
    /// normal authentication attempt.
    pub fn on_swipe(&mut self, uid: CardUid, timeout_ms: u64, now: u64) -> Option<EnrollStep> {
        if self.check_timeout(now) {
            return Some(EnrollStep::TimedOut);
        }
        match std::mem::take(self) {
            SwipeEnroll::Inactive => None,
            SwipeEnroll::AwaitingFirst { .. } => {
                *self = SwipeEnroll::AwaitingSecond {
                    first: uid.clone(),
                    deadline: now.saturating_add(timeout_ms),
                };
                Some(EnrollStep::FirstSwipe(uid))
            }
            SwipeEnroll::AwaitingSecond { first, .. } => {
                if first == uid {
                    Some(EnrollStep::Confirmed(uid))
                } else {
                    Some(EnrollStep::Mismatch { first, second: uid })
                }
            }
        }
    }

    /// End an enrollment whose deadline has passed.
    ///
    /// # Returns
    ///
    /// Returns `true` if this call ended it.
    pub fn check_timeout(&mut self, now: u64) -> bool {
        if self.deadline().is_some_and(|deadline| deadline_reached(now, deadline)) {
            self.cancel();
            return true;
        }
        false
    }

    /// Whole seconds left, zero when inactive.
    pub fn remaining_secs(&self, now: u64) -> u64 {
        self.deadline()
            .map_or(0, |deadline| remaining_ms(now, deadline).div_ceil(1000))
    }
}
