//! # Task abstraction.
//!
//! This module defines the [`Task`] trait: an async, cancelable unit of work that
//! is invoked once per tick. The common handle type is [`TaskRef`], an
//! `Arc<dyn Task>` shared between the tick loop and every combinator.
//!
//! A task receives a [`Context`] and should check it when it can block for
//! long, so that `stop()` and `timeout` take effect promptly.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::context::Context;
use crate::error::TaskError;

/// Boxed future returned by [`Task::spawn`].
pub type BoxTaskFuture = BoxFuture<'static, Result<(), TaskError>>;

/// # Shared handle to a task object.
///
/// This is the canonical function shape: every combinator takes and returns it.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cancelable unit.
///
/// Each call to [`spawn`](Task::spawn) creates a **new** future for one
/// invocation. Invocations may overlap; a task that cannot tolerate that must be
/// wrapped with [`no_overlap`](crate::combinators::no_overlap) or
/// [`sync`](crate::combinators::sync).
///
/// # Example
/// ```
/// use tickvisor::{BoxTaskFuture, Context, Task, TaskError};
///
/// struct Flush;
///
/// impl Task for Flush {
///     fn spawn(&self, ctx: Context) -> BoxTaskFuture {
///         Box::pin(async move {
///             if ctx.is_cancelled() {
///                 return Err(TaskError::Canceled);
///             }
///             // flush buffers...
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Creates the future for one invocation.
    fn spawn(&self, ctx: Context) -> BoxTaskFuture;
}
