//! Trait for entries with a validity window.
//!
//! Windows are expressed in wall-clock Unix seconds. A zero bound is open:
//! `effective_at = 0` means "effective immediately" and `expire_at = 0`
//! means "never expires".
//!
//! The window is half-open, `[effective_at, expire_at)`: an entry is
//! already expired at the exact second given as `expire_at`.
//!
//! # Usage
//!
//! ```
//! use latchkey_storage::models::{ValidityWindow, WindowStatus};
//!
//! struct Pass {
//!     from: u64,
//!     until: u64,
//! }
//!
//! impl ValidityWindow for Pass {
//!     fn effective_at(&self) -> u64 {
//!         self.from
//!     }
//!
//!     fn expire_at(&self) -> u64 {
//!         self.until
//!     }
//! }
//!
//! let pass = Pass { from: 100, until: 200 };
//! assert_eq!(pass.status(50), WindowStatus::Pending);
//! assert_eq!(pass.status(100), WindowStatus::Active);
//! assert_eq!(pass.status(200), WindowStatus::Expired);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where `now` falls relative to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStatus {
    /// Not yet effective.
    Pending,
    Active,
    Expired,
}

impl WindowStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WindowStatus::Pending => "pending",
            WindowStatus::Active => "active",
            WindowStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for WindowStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entries valid between two wall-clock instants.
///
/// Implementors provide the two bounds; the checks are derived from them.
pub trait ValidityWindow {
    /// First second of validity, `0` for "immediately".
    fn effective_at(&self) -> u64;

    /// First second of invalidity, `0` for "never".
    fn expire_at(&self) -> u64;

    /// Returns `true` once `now` has reached the effective time.
    fn is_effective(&self, now: u64) -> bool {
        let from = self.effective_at();
        from == 0 || now >= from
    }

    /// Returns `true` once `now` has reached a non-zero expiry.
    fn is_expired(&self, now: u64) -> bool {
        let until = self.expire_at();
        until != 0 && now >= until
    }

    /// Returns `true` if `now` is inside the window.
    fn is_valid_at(&self, now: u64) -> bool {
        self.is_effective(now) && !self.is_expired(now)
    }

    /// Classify `now` against the window. Expiry wins over pending.
    fn status(&self, now: u64) -> WindowStatus {
        if self.is_expired(now) {
            WindowStatus::Expired
        } else if !self.is_effective(now) {
            WindowStatus::Pending
        } else {
            WindowStatus::Active
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct Window(u64, u64);

    impl ValidityWindow for Window {
        fn effective_at(&self) -> u64 {
            self.0
        }

        fn expire_at(&self) -> u64 {
            self.1
        }
    }

    #[rstest]
    #[case(0, 0, 0, WindowStatus::Active)]
    #[case(0, 0, u64::MAX, WindowStatus::Active)]
    #[case(100, 0, 99, WindowStatus::Pending)]
    #[case(100, 0, 100, WindowStatus::Active)]
    #[case(0, 200, 199, WindowStatus::Active)]
    #[case(0, 200, 200, WindowStatus::Expired)]
    #[case(300, 200, 250, WindowStatus::Expired)]
    fn test_window_status(
        #[case] from: u64,
        #[case] until: u64,
        #[case] now: u64,
        #[case] expected: WindowStatus,
    ) {
        let window = Window(from, until);
        assert_eq!(window.status(now), expected);
        assert_eq!(window.is_valid_at(now), expected == WindowStatus::Active);
    }
}
