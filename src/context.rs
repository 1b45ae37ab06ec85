//! # Invocation context.
//!
//! [`Context`] is what every task invocation receives. It carries:
//! - a cancellation scope (backed by a [`CancellationToken`]) with a recorded cause;
//! - an optional deadline (set by the [`timeout`](crate::combinators::timeout) combinator);
//! - typed metadata: the periodic task name and the retry attempt index.
//!
//! ## Cancellation causes
//! ```text
//! background ──► with_cancel() ──► with_cancel() ...
//!   (root)         scope A            scope B
//!
//! cancel(A, Stopped)  → A.cause = Stopped, B inherits it (B.cause() == Stopped)
//! cancel(B, X)        → only B and its children observe X
//! ```
//!
//! - [`Context::err`] reports **how** the context ended (`Canceled` or `DeadlineExceeded`).
//! - [`Context::cause`] reports **why** (e.g. `Stopped` once a tick loop has exited).
//!
//! Contexts are cheap to clone; clones share the same scope.

use std::sync::{Arc, OnceLock};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// One level of the cancellation tree.
#[derive(Debug)]
struct Scope {
    token: CancellationToken,
    cause: OnceLock<TaskError>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    fn root() -> Self {
        Self {
            token: CancellationToken::new(),
            cause: OnceLock::new(),
            parent: None,
        }
    }

    fn child(parent: &Arc<Scope>) -> Self {
        Self {
            token: parent.token.child_token(),
            cause: OnceLock::new(),
            parent: Some(Arc::clone(parent)),
        }
    }

    /// Cancels this scope, keeping the first cause only.
    fn cancel(&self, cause: TaskError) {
        if self.token.is_cancelled() {
            return;
        }
        let _ = self.cause.set(cause);
        self.token.cancel();
    }

    fn cause(&self) -> Option<TaskError> {
        if !self.token.is_cancelled() {
            return None;
        }
        if let Some(cause) = self.cause.get() {
            return Some(cause.clone());
        }
        match &self.parent {
            Some(parent) => parent.cause(),
            None => Some(TaskError::Canceled),
        }
    }
}

/// Cancellable, metadata-carrying context handed to every invocation.
#[derive(Clone, Debug)]
pub struct Context {
    scope: Arc<Scope>,
    deadline: Option<Instant>,
    task_name: Option<Arc<str>>,
    attempt: Option<u32>,
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    /// Returns a fresh root context: never cancelled, no deadline, no metadata.
    pub fn background() -> Self {
        Self {
            scope: Arc::new(Scope::root()),
            deadline: None,
            task_name: None,
            attempt: None,
        }
    }

    /// Derives a cancellable child context.
    ///
    /// The child is cancelled when the returned [`CancelHandle`] is used, or when
    /// any ancestor is cancelled. Metadata and deadline are inherited.
    ///
    /// # Example
    /// ```
    /// use tickvisor::{Context, TaskError};
    ///
    /// let parent = Context::background();
    /// let (child, cancel) = parent.with_cancel();
    /// cancel.cancel(TaskError::Stopped);
    ///
    /// assert!(child.is_cancelled());
    /// assert_eq!(child.err(), Some(TaskError::Canceled));
    /// assert_eq!(child.cause(), Some(TaskError::Stopped));
    /// assert!(!parent.is_cancelled());
    /// ```
    pub fn with_cancel(&self) -> (Context, CancelHandle) {
        let scope = Arc::new(Scope::child(&self.scope));
        let handle = CancelHandle {
            scope: Arc::clone(&scope),
        };
        let ctx = Context {
            scope,
            deadline: self.deadline,
            task_name: self.task_name.clone(),
            attempt: self.attempt,
        };
        (ctx, handle)
    }

    /// Derives a cancellable child bound to `deadline` (or the inherited one, if earlier).
    ///
    /// The deadline is recorded, not enforced: whoever derives the context must
    /// cancel it with [`TaskError::DeadlineExceeded`] once the deadline passes.
    pub(crate) fn with_deadline(&self, deadline: Instant) -> (Context, CancelHandle) {
        let (mut ctx, handle) = self.with_cancel();
        ctx.deadline = Some(match self.deadline {
            Some(inherited) if inherited < deadline => inherited,
            _ => deadline,
        });
        (ctx, handle)
    }

    /// Returns the same context tagged with a periodic task name.
    pub fn with_task_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.task_name = Some(name.into());
        self
    }

    /// Returns the same context tagged with a zero-based retry attempt index.
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Name of the periodic task this invocation belongs to, if any.
    pub fn task_name(&self) -> Option<&str> {
        self.task_name.as_deref()
    }

    /// Zero-based retry attempt index, if running under [`retry`](crate::combinators::retry).
    pub fn attempt(&self) -> Option<u32> {
        self.attempt
    }

    /// Deadline of this context, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` once this context (or an ancestor) is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.scope.token.is_cancelled()
    }

    /// Resolves when this context is cancelled.
    pub async fn cancelled(&self) {
        self.scope.token.cancelled().await
    }

    /// How the context ended: `None` while live, otherwise
    /// [`TaskError::DeadlineExceeded`] or [`TaskError::Canceled`].
    pub fn err(&self) -> Option<TaskError> {
        self.cause().map(|cause| match cause {
            TaskError::DeadlineExceeded => TaskError::DeadlineExceeded,
            _ => TaskError::Canceled,
        })
    }

    /// Why the context ended: the cause recorded by the nearest cancelled scope.
    pub fn cause(&self) -> Option<TaskError> {
        self.scope.cause()
    }

    /// The underlying cancellation token, for interop with token-based APIs.
    pub fn token(&self) -> &CancellationToken {
        &self.scope.token
    }
}

/// Cancels the context returned alongside it by [`Context::with_cancel`].
#[derive(Debug)]
pub struct CancelHandle {
    scope: Arc<Scope>,
}

impl CancelHandle {
    /// Cancels the context with `cause`. Only the first cause is kept.
    pub fn cancel(&self, cause: TaskError) {
        self.scope.cancel(cause);
    }

    /// Converts the handle into a guard that cancels with `cause` when dropped.
    pub fn guard(self, cause: TaskError) -> CancelGuard {
        CancelGuard {
            scope: self.scope,
            cause: Some(cause),
        }
    }
}

/// Cancels its context on drop. See [`CancelHandle::guard`].
#[derive(Debug)]
pub struct CancelGuard {
    scope: Arc<Scope>,
    cause: Option<TaskError>,
}

impl CancelGuard {
    /// Cancels right away with `cause`; the guard then does nothing on drop.
    pub fn cancel(mut self, cause: TaskError) {
        self.cause = None;
        self.scope.cancel(cause);
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if let Some(cause) = self.cause.take() {
            self.scope.cancel(cause);
        }
    }
}
