//! Retry policies.
//!
//! This module groups the knobs that control **whether** a failed attempt is
//! retried and **how long** to wait before the next one.
//!
//! ## Contents
//! - [`RetryPolicy`] the decision contract, also implemented by plain closures
//! - [`SimpleRetry`]  fixed number of attempts, no delay
//! - [`BackoffRetry`] fixed number of attempts, delays from a [`BackoffPolicy`]
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization of delays
//!
//! ## Quick wiring
//! ```text
//! retry(BackoffRetry::new(5, backoff), task)
//!      └─► after each failed attempt n:
//!           - sleep backoff.delay(n) (abandoned on cancellation)
//!           - continue while n + 1 < 5
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=100ms, factor=1.0 (constant), max=30s, jitter=None.
//! - `JitterPolicy::None` by default; consider `Equal` when many tasks share a dependency.

mod backoff;
mod jitter;
mod retry;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use retry::{BackoffRetry, RetryPolicy, SimpleRetry};
