//! # Delays between retry attempts.
//!
//! [`BackoffPolicy`] maps the index of a failed attempt to the pause before
//! the next one: `first × factor^attempt`, capped at `max`, then jittered.
//! Each delay is computed from the index alone.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use tickvisor::policies::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.delay(0), Duration::from_millis(100));
//! assert_eq!(backoff.delay(1), Duration::from_millis(200));
//! assert_eq!(backoff.delay(10), Duration::from_secs(10));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Growth of retry delays.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay after the first failed attempt.
    pub first: Duration,
    /// Upper bound of any delay, before jitter.
    pub max: Duration,
    /// Multiplicative growth per attempt; `1.0` keeps the delay constant.
    pub factor: f64,
    /// Randomization applied to the capped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Constant 100ms delay (`factor = 1.0`), capped at 30s, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Doubling delays starting at `first`, capped at 30s.
    pub fn exponential(first: Duration) -> Self {
        Self {
            first,
            factor: 2.0,
            ..Self::default()
        }
    }

    /// Pause after the failed attempt `attempt` (0-indexed).
    ///
    /// Growth that overflows, or is not a valid duration, yields `max`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let grown = self.first.as_secs_f64() * self.factor.powi(exp);
        let capped = Duration::try_from_secs_f64(grown).map_or(self.max, |d| d.min(self.max));
        self.jitter.apply(capped)
    }
}
