//! # Tick loop: turn ticks into concurrent invocations.
//!
//! [`tick_loop`] consumes a [`TickStream`] and spawns one invocation per tick
//! until the first terminal condition:
//!
//! ```text
//! loop {
//!   select! (biased) {
//!     ├─► invocation reported Err(e) ─► return e
//!     ├─► tick                       ─► spawn task.spawn(child_ctx) (not awaited)
//!     ├─► stream closed              ─► return Stopped
//!     └─► parent cancelled           ─► return parent.err()
//!   }
//! }
//! on exit: child_ctx cancelled with cause Stopped
//! ```
//!
//! ## Rules
//! - Exactly **one** terminal condition is returned; it is stored in a one-shot
//!   slot, so invocations failing later are discarded without blocking.
//! - When several conditions are ready at once the priority is fixed:
//!   invocation error, then closed stream, then parent cancellation.
//! - Invocations still running after return are **not** awaited here; callers
//!   that need to drain them pass a [`TaskTracker`].
//! - Invocations may overlap; wrap the task with
//!   [`no_overlap`](crate::combinators::no_overlap) for single-flight.

use std::sync::{Arc, OnceLock};

use tokio::select;
use tokio::sync::Notify;
use tokio_util::task::TaskTracker;

use crate::context::Context;
use crate::error::TaskError;
use crate::tasks::TaskRef;
use crate::ticker::TickStream;

/// One-shot terminal slot shared by the loop and its invocations.
#[derive(Default)]
struct Terminal {
    cause: OnceLock<TaskError>,
    notify: Notify,
}

impl Terminal {
    /// Records `err` if nothing was recorded yet and wakes the loop.
    fn report(&self, err: TaskError) {
        if self.cause.set(err).is_ok() {
            self.notify.notify_one();
        }
    }

    fn get(&self) -> Option<&TaskError> {
        self.cause.get()
    }
}

/// Runs `task` on every tick of `ticks` and returns why the loop stopped.
///
/// Invocations receive a child of `parent`. Once the loop returns, that child is
/// cancelled with cause [`TaskError::Stopped`], which invocations still running
/// can observe via [`Context::cause`].
///
/// # Example
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use tickvisor::{adapt, tick_loop, Context, TaskError};
/// use tokio::sync::mpsc;
///
/// let (tx, rx) = mpsc::channel(1);
/// drop(tx);
///
/// let err = tick_loop(rx, &Context::background(), adapt::unit(|| async {})).await;
/// assert_eq!(err, TaskError::Stopped);
/// # }
/// ```
pub async fn tick_loop(ticks: TickStream, parent: &Context, task: TaskRef) -> TaskError {
    run(ticks, parent, task, None).await
}

/// Same as [`tick_loop`], spawning invocations on `tracker` when given.
pub(crate) async fn run(
    mut ticks: TickStream,
    parent: &Context,
    task: TaskRef,
    tracker: Option<&TaskTracker>,
) -> TaskError {
    let (ctx, cancel) = parent.with_cancel();
    let _cancel_on_exit = cancel.guard(TaskError::Stopped);
    let terminal = Arc::new(Terminal::default());

    loop {
        if let Some(err) = terminal.get() {
            return err.clone();
        }

        select! {
            biased;
            _ = terminal.notify.notified() => {}
            tick = ticks.recv() => match tick {
                Some(_) => {
                    let invocation = invoke(Arc::clone(&task), ctx.clone(), Arc::clone(&terminal));
                    match tracker {
                        Some(tracker) => drop(tracker.spawn(invocation)),
                        None => drop(tokio::spawn(invocation)),
                    }
                }
                None => terminal.report(TaskError::Stopped),
            },
            _ = parent.cancelled() => {
                terminal.report(parent.err().unwrap_or(TaskError::Canceled));
            }
        }
    }
}

/// One invocation: run the task and report its error, if it is the first terminal condition.
async fn invoke(task: TaskRef, ctx: Context, terminal: Arc<Terminal>) {
    if let Err(err) = task.spawn(ctx).await {
        terminal.report(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{TaskFn, adapt};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    #[tokio::test]
    async fn ticks_with_cancel() {
        let (tick_tx, ticks) = mpsc::channel(1);
        let (done_tx, mut done_rx) = mpsc::channel::<u32>(1);
        let (parent, cancel) = Context::background().with_cancel();

        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let task = adapt::unit(move || {
            let done_tx = done_tx.clone();
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                let _ = done_tx.send(n).await;
            }
        });

        let driver = tokio::spawn(async move {
            for _ in 0..3 {
                tick_tx.send(Instant::now()).await.expect("tick");
                done_rx.recv().await.expect("invocation");
            }
            cancel.cancel(TaskError::Canceled);
            tick_tx
        });

        let err = tick_loop(ticks, &parent, task).await;
        let _tick_tx = driver.await.expect("driver");

        assert_eq!(err, TaskError::Canceled);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn closed_without_ticks() {
        let (tick_tx, ticks) = mpsc::channel(1);
        drop(tick_tx);

        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let task = adapt::unit(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {}
        });

        assert_eq!(tick_loop(ticks, &Context::background(), task).await, TaskError::Stopped);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn close_after_ticks() {
        let (tick_tx, ticks) = mpsc::channel(1);
        let (done_tx, mut done_rx) = mpsc::channel::<()>(1);

        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let task = adapt::unit(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let done_tx = done_tx.clone();
            async move {
                let _ = done_tx.send(()).await;
            }
        });

        tokio::spawn(async move {
            for _ in 0..3 {
                tick_tx.send(Instant::now()).await.expect("tick");
                done_rx.recv().await.expect("invocation");
            }
        });

        assert_eq!(tick_loop(ticks, &Context::background(), task).await, TaskError::Stopped);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stopped_by_an_error() {
        let (tick_tx, ticks) = mpsc::channel(3);
        for _ in 0..3 {
            tick_tx.send(Instant::now()).await.expect("tick");
        }

        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let task = adapt::fallible(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(TaskError::fail("test")) }
        });

        let err = tick_loop(ticks, &Context::background(), task).await;
        assert_eq!(err, TaskError::fail("test"));
        assert!(count.load(Ordering::SeqCst) >= 1);
        drop(tick_tx);
    }

    #[tokio::test]
    async fn error_report_never_blocks_late_invocations() {
        let (tick_tx, ticks) = mpsc::channel(1);
        let (release_tx, _) = tokio::sync::broadcast::channel::<()>(1);
        let (started_tx, mut started_rx) = mpsc::channel::<()>(4);
        let tracker = TaskTracker::new();

        let release = release_tx.clone();
        let task = TaskFn::arc(move |_ctx: Context| {
            let mut release = release.subscribe();
            let started_tx = started_tx.clone();
            async move {
                let _ = started_tx.send(()).await;
                let _ = release.recv().await;
                Err(TaskError::fail("late"))
            }
        });

        let driver = tokio::spawn(async move {
            for _ in 0..2 {
                tick_tx.send(Instant::now()).await.expect("tick");
                started_rx.recv().await.expect("started");
            }
            drop(tick_tx);
        });

        let err = run(ticks, &Context::background(), task, Some(&tracker)).await;
        driver.await.expect("driver");
        assert_eq!(err, TaskError::Stopped);

        // Both invocations fail after the loop returned; they must still finish.
        release_tx.send(()).expect("release");
        tracker.close();
        tracker.wait().await;
    }

    #[tokio::test]
    async fn closed_stream_wins_over_cancelled_parent() {
        let (tick_tx, ticks) = mpsc::channel(1);
        drop(tick_tx);
        let (parent, cancel) = Context::background().with_cancel();
        cancel.cancel(TaskError::Canceled);

        let err = tick_loop(ticks, &parent, adapt::unit(|| async {})).await;
        assert_eq!(err, TaskError::Stopped);
    }

    #[tokio::test]
    async fn reported_error_wins_over_closed_stream_and_cancelled_parent() {
        let (tick_tx, ticks) = mpsc::channel(1);
        let (failing_tx, mut failing_rx) = mpsc::channel::<()>(1);
        let (parent, cancel) = Context::background().with_cancel();

        let task = TaskFn::arc(move |_ctx: Context| {
            let failing_tx = failing_tx.clone();
            async move {
                let _ = failing_tx.send(()).await;
                Err(TaskError::fail("test"))
            }
        });

        let driver = tokio::spawn(async move {
            tick_tx.send(Instant::now()).await.expect("tick");
            failing_rx.recv().await.expect("invocation");
            // The error is reported by now; close and cancel on top of it.
            drop(tick_tx);
            cancel.cancel(TaskError::Canceled);
        });

        let err = tick_loop(ticks, &parent, task).await;
        driver.await.expect("driver");
        assert_eq!(err, TaskError::fail("test"));
    }

    #[tokio::test]
    async fn cancellation_cause() {
        let (tick_tx, ticks) = mpsc::channel(1);
        tick_tx.send(Instant::now()).await.expect("tick");
        drop(tick_tx);

        let (seen_tx, mut seen_rx) = mpsc::channel(1);
        let task = adapt::contextual(move |ctx: Context| {
            let seen_tx = seen_tx.clone();
            async move {
                ctx.cancelled().await;
                let _ = seen_tx.send((ctx.err(), ctx.cause())).await;
            }
        });

        let err = tick_loop(ticks, &Context::background(), task).await;
        assert_eq!(err, TaskError::Stopped);
        assert_eq!(
            seen_rx.recv().await,
            Some((Some(TaskError::Canceled), Some(TaskError::Stopped)))
        );
    }
}
