//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(Context) -> Fut`, producing a fresh
//! future per invocation. This is the canonical shape; simpler shapes go
//! through [`adapt`](crate::adapt).
//!
//! ## Concurrency semantics
//! - Every [`Task::spawn`] call creates a **new** future that owns its state.
//! - There is no hidden mutation between invocations; shared state has to be
//!   put behind an explicit `Arc<...>` inside the closure.
//!
//! ## Example
//! ```rust
//! use tickvisor::{Context, TaskFn, TaskRef, TaskError};
//!
//! let t: TaskRef = TaskFn::arc(|ctx: Context| async move {
//!     if ctx.is_cancelled() {
//!         return Err(TaskError::Canceled);
//!     }
//!     Ok(())
//! });
//! # let _ = t;
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::context::Context;
use crate::error::TaskError;
use crate::tasks::task::{BoxTaskFuture, Task};

/// Function-backed task implementation.
///
/// Wraps a closure that *creates* a new future per invocation.
#[derive(Debug)]
pub struct TaskFn<F> {
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc<Fut>(f: F) -> Arc<Self>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Arc::new(Self::new(f))
    }
}

impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(Context) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn spawn(&self, ctx: Context) -> BoxTaskFuture {
        Box::pin((self.f)(ctx))
    }
}
