use std::sync::Arc;
use std::time::Duration;

use tokio::select;
use tokio::time::{Instant, sleep_until};

use crate::context::Context;
use crate::error::TaskError;
use crate::tasks::{BoxTaskFuture, Task, TaskRef};

/// Bounds every call of `task` to `after`.
///
/// The call gets a child context with a deadline. Once the deadline passes the
/// child is cancelled with [`TaskError::DeadlineExceeded`] and the call is
/// awaited until it returns; a task that ignores its context is not cut short.
/// The child context is released when the call returns.
///
/// # Example
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use std::time::Duration;
/// use tickvisor::{Context, TaskError, TaskFn, combinators};
///
/// let slow = TaskFn::arc(|ctx: Context| async move {
///     ctx.cancelled().await;
///     Err(ctx.err().unwrap_or(TaskError::Canceled))
/// });
/// let bounded = combinators::timeout(Duration::from_millis(10), slow);
///
/// let res = tickvisor::Task::spawn(&*bounded, Context::background()).await;
/// assert_eq!(res, Err(TaskError::DeadlineExceeded));
/// # }
/// ```
pub fn timeout(after: Duration, task: TaskRef) -> TaskRef {
    Arc::new(Timeout { after, task })
}

struct Timeout {
    after: Duration,
    task: TaskRef,
}

impl Task for Timeout {
    fn spawn(&self, ctx: Context) -> BoxTaskFuture {
        let (child, cancel) = ctx.with_deadline(Instant::now() + self.after);
        // with_deadline keeps an earlier inherited deadline.
        let deadline = child.deadline();
        let mut fut = self.task.spawn(child);

        Box::pin(async move {
            let release = cancel.guard(TaskError::Canceled);
            let Some(deadline) = deadline else {
                return fut.await;
            };
            select! {
                biased;
                res = &mut fut => res,
                _ = sleep_until(deadline) => {
                    release.cancel(TaskError::DeadlineExceeded);
                    fut.await
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{TaskFn, adapt};

    fn wait_for_cancel() -> TaskRef {
        TaskFn::arc(|ctx: Context| async move {
            ctx.cancelled().await;
            Err(ctx.err().unwrap_or(TaskError::Canceled))
        })
    }

    #[tokio::test(start_paused = true)]
    async fn cancels_with_deadline_exceeded() {
        let started = Instant::now();
        let task = timeout(Duration::from_secs(2), wait_for_cancel());
        assert_eq!(
            task.spawn(Context::background()).await,
            Err(TaskError::DeadlineExceeded)
        );
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn fast_calls_are_untouched() {
        let task = timeout(Duration::from_secs(2), adapt::unit(|| async {}));
        assert_eq!(task.spawn(Context::background()).await, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn child_context_is_released_on_return() {
        let (seen_tx, mut seen_rx) = tokio::sync::mpsc::channel(1);
        let task = timeout(
            Duration::from_secs(60),
            TaskFn::arc(move |ctx: Context| {
                let seen_tx = seen_tx.clone();
                async move {
                    let _ = seen_tx.send(ctx).await;
                    Ok(())
                }
            }),
        );

        assert_eq!(task.spawn(Context::background()).await, Ok(()));
        let leaked = seen_rx.recv().await.expect("context");
        assert!(leaked.deadline().is_some());
        assert_eq!(leaked.err(), Some(TaskError::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn nested_timeouts_keep_the_shortest() {
        let started = Instant::now();
        let task = timeout(
            Duration::from_secs(1),
            timeout(Duration::from_secs(10), wait_for_cancel()),
        );
        assert_eq!(
            task.spawn(Context::background()).await,
            Err(TaskError::DeadlineExceeded)
        );
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }
}
