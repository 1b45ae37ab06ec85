//! # Retry policies.
//!
//! A [`RetryPolicy`] is consulted by the [`retry`](crate::combinators::retry)
//! combinator after every attempt. It receives the invocation context, the
//! zero-based attempt index and the attempt's error (if any), and answers
//! whether to run another attempt. Policies may wait before answering, which is
//! how [`BackoffRetry`] spaces attempts out.
//!
//! ```text
//! attempt 0 ─► Err ─► should_retry(ctx, 0, Some(err)) ─► true ─► attempt 1 ─► ...
//!                                                      └► false ─► return last result
//! ```
//!
//! Plain closures `Fn(&Context, u32, Option<&TaskError>) -> bool` are policies too.

use async_trait::async_trait;
use tokio::select;

use crate::context::Context;
use crate::error::TaskError;
use crate::policies::BackoffPolicy;

/// Decides whether a failed attempt is retried.
#[async_trait]
pub trait RetryPolicy: Send + Sync + 'static {
    /// Returns `true` to run attempt `attempt + 1`.
    ///
    /// `err` is `None` when the attempt succeeded.
    async fn should_retry(&self, ctx: &Context, attempt: u32, err: Option<&TaskError>) -> bool;
}

#[async_trait]
impl<F> RetryPolicy for F
where
    F: Fn(&Context, u32, Option<&TaskError>) -> bool + Send + Sync + 'static,
{
    async fn should_retry(&self, ctx: &Context, attempt: u32, err: Option<&TaskError>) -> bool {
        self(ctx, attempt, err)
    }
}

/// Runs a task at most `attempts` times, retrying right away.
#[derive(Clone, Copy, Debug)]
pub struct SimpleRetry {
    attempts: u32,
}

impl SimpleRetry {
    /// `attempts` counts the first run: `SimpleRetry::new(3)` means up to 2 retries.
    pub fn new(attempts: u32) -> Self {
        Self { attempts }
    }
}

#[async_trait]
impl RetryPolicy for SimpleRetry {
    async fn should_retry(&self, ctx: &Context, attempt: u32, err: Option<&TaskError>) -> bool {
        err.is_some() && attempt.saturating_add(1) < self.attempts && !ctx.is_cancelled()
    }
}

/// Like [`SimpleRetry`], sleeping `backoff.delay(attempt)` before every retry.
///
/// The sleep is abandoned, and no retry happens, once the context is cancelled.
/// There is no sleep after the final attempt.
#[derive(Clone, Copy, Debug)]
pub struct BackoffRetry {
    attempts: u32,
    backoff: BackoffPolicy,
}

impl BackoffRetry {
    /// Runs a task at most `attempts` times, pausing `backoff.delay(n)` after failed attempt `n`.
    pub fn new(attempts: u32, backoff: BackoffPolicy) -> Self {
        Self { attempts, backoff }
    }

    /// Doubling delays starting at `first`. See [`BackoffPolicy::exponential`].
    pub fn exponential(attempts: u32, first: std::time::Duration) -> Self {
        Self::new(attempts, BackoffPolicy::exponential(first))
    }
}

#[async_trait]
impl RetryPolicy for BackoffRetry {
    async fn should_retry(&self, ctx: &Context, attempt: u32, err: Option<&TaskError>) -> bool {
        if err.is_none() || ctx.is_cancelled() || attempt.saturating_add(1) >= self.attempts {
            return false;
        }
        select! {
            biased;
            _ = ctx.cancelled() => false,
            _ = tokio::time::sleep(self.backoff.delay(attempt)) => true,
        }
    }
}
