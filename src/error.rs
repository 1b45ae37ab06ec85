//! Error types used by periodic tasks and their combinators.
//!
//! This module defines two enums:
//!
//! - [`TaskError`] the terminal cause of an invocation or of a whole run.
//! - [`BuildError`] misuse detected while constructing a [`PeriodicTask`](crate::PeriodicTask).
//!
//! [`TaskError`] provides `as_label` for logs/metrics and
//! [`TaskError::is_context_error`] to tell cancellation apart from real failures.

use std::fmt::Display;
use std::sync::Arc;

use thiserror::Error;

/// # Errors produced by task invocations and tick loops.
///
/// Three families:
/// - the [`TaskError::Stopped`] sentinel: deliberate or engine-driven shutdown;
/// - context errors ([`TaskError::Canceled`], [`TaskError::DeadlineExceeded`]);
/// - an opaque task failure ([`TaskError::Fail`]).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Execution was stopped, either by the caller or by the engine itself.
    #[error("stopped")]
    Stopped,

    /// The invocation context was cancelled.
    #[error("context canceled")]
    Canceled,

    /// The invocation context passed its deadline.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// The task itself failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl TaskError {
    /// Wraps any displayable error into [`TaskError::Fail`].
    ///
    /// # Example
    /// ```
    /// use tickvisor::TaskError;
    ///
    /// let err = TaskError::fail("connection refused");
    /// assert_eq!(err.to_string(), "execution failed: connection refused");
    /// ```
    pub fn fail(error: impl Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Stopped => "task_stopped",
            TaskError::Canceled => "task_canceled",
            TaskError::DeadlineExceeded => "task_deadline_exceeded",
            TaskError::Fail { .. } => "task_failed",
        }
    }

    /// Returns `true` for errors that only report the state of the context
    /// ([`TaskError::Canceled`] and [`TaskError::DeadlineExceeded`]).
    ///
    /// Such errors never trigger an engine-initiated stop.
    ///
    /// # Example
    /// ```
    /// use tickvisor::TaskError;
    ///
    /// assert!(TaskError::Canceled.is_context_error());
    /// assert!(!TaskError::Stopped.is_context_error());
    /// assert!(!TaskError::fail("boom").is_context_error());
    /// ```
    pub fn is_context_error(&self) -> bool {
        matches!(self, TaskError::Canceled | TaskError::DeadlineExceeded)
    }
}

/// # Errors produced while building a periodic task.
///
/// These are caller mistakes: no valid recovery exists other than fixing the
/// construction site.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// No task function was supplied.
    #[error("no function provided for {name:?} task")]
    MissingTask {
        /// Name of the periodic task.
        name: Arc<str>,
    },

    /// The period is zero.
    #[error("period of {name:?} task must be greater than zero")]
    ZeroPeriod {
        /// Name of the periodic task.
        name: Arc<str>,
    },

    /// Built outside of a tokio runtime.
    #[error("{name:?} task must be built inside a tokio runtime")]
    NoRuntime {
        /// Name of the periodic task.
        name: Arc<str>,
    },
}

impl BuildError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BuildError::MissingTask { .. } => "build_missing_task",
            BuildError::ZeroPeriod { .. } => "build_zero_period",
            BuildError::NoRuntime { .. } => "build_no_runtime",
        }
    }
}
