//! # Task combinators.
//!
//! Every combinator takes one or more [`TaskRef`]s and returns a new
//! [`TaskRef`], so they nest freely:
//!
//! ```text
//! log(sink, "sync", retry(SimpleRetry::new(3), timeout(5s, no_overlap(task))))
//! ```
//!
//! | Combinator     | Behavior                                                          |
//! |----------------|-------------------------------------------------------------------|
//! | [`seq`]        | run in order, stop at the first error                             |
//! | [`ignore_err`] | run, always succeed                                               |
//! | [`sync`]       | hold a shared lock for the whole call                             |
//! | [`no_overlap`] | skip the call (and succeed) while a previous one is still running |
//! | [`timeout`]    | cancel the call's context with `DeadlineExceeded` after a delay   |
//! | [`retry`]      | repeat the call while a [`RetryPolicy`](crate::policies::RetryPolicy) agrees |
//! | [`log`]        | write a record before the call and one after a failed call        |

mod log;
mod retry;
mod timeout;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use crate::context::Context;
use crate::tasks::{BoxTaskFuture, Task, TaskRef};

pub use log::log;
pub use retry::retry;
pub use timeout::timeout;

/// Runs `tasks` one after another with the same context.
///
/// Stops at, and returns, the first error; later tasks do not run.
pub fn seq(tasks: impl IntoIterator<Item = TaskRef>) -> TaskRef {
    Arc::new(Seq {
        tasks: tasks.into_iter().collect(),
    })
}

struct Seq {
    tasks: Arc<[TaskRef]>,
}

impl Task for Seq {
    fn spawn(&self, ctx: Context) -> BoxTaskFuture {
        let tasks = Arc::clone(&self.tasks);
        Box::pin(async move {
            for task in tasks.iter() {
                task.spawn(ctx.clone()).await?;
            }
            Ok(())
        })
    }
}

/// Runs `task` and discards its error.
pub fn ignore_err(task: TaskRef) -> TaskRef {
    Arc::new(IgnoreErr { task })
}

struct IgnoreErr {
    task: TaskRef,
}

impl Task for IgnoreErr {
    fn spawn(&self, ctx: Context) -> BoxTaskFuture {
        let fut = self.task.spawn(ctx);
        Box::pin(async move {
            let _ = fut.await;
            Ok(())
        })
    }
}

/// Runs `task` while holding `lock`.
///
/// Share one lock between several tasks to serialize them. The lock is
/// released however the call ends, including when its future is dropped.
pub fn sync(lock: Arc<Mutex<()>>, task: TaskRef) -> TaskRef {
    Arc::new(Serialized { lock, task })
}

struct Serialized {
    lock: Arc<Mutex<()>>,
    task: TaskRef,
}

impl Task for Serialized {
    fn spawn(&self, ctx: Context) -> BoxTaskFuture {
        let lock = Arc::clone(&self.lock);
        let task = Arc::clone(&self.task);
        Box::pin(async move {
            let _held = lock.lock().await;
            task.spawn(ctx).await
        })
    }
}

/// Skips calls (returning `Ok`) while a previous call of `task` is still running.
pub fn no_overlap(task: TaskRef) -> TaskRef {
    Arc::new(NoOverlap {
        running: Arc::new(AtomicBool::new(false)),
        task,
    })
}

struct NoOverlap {
    running: Arc<AtomicBool>,
    task: TaskRef,
}

/// Clears the in-flight flag on drop.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Task for NoOverlap {
    fn spawn(&self, ctx: Context) -> BoxTaskFuture {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Box::pin(async { Ok(()) });
        }
        let in_flight = InFlight(Arc::clone(&self.running));
        let fut = self.task.spawn(ctx);
        Box::pin(async move {
            let _in_flight = in_flight;
            fut.await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::tasks::{TaskFn, adapt};
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::AtomicU32;
    use tokio::sync::Notify;

    fn recording(
        trace: &Arc<StdMutex<Vec<&'static str>>>,
        tag: &'static str,
        res: Result<(), TaskError>,
    ) -> TaskRef {
        let trace = Arc::clone(trace);
        adapt::fallible(move || {
            trace.lock().expect("trace").push(tag);
            let res = res.clone();
            async move { res }
        })
    }

    #[tokio::test]
    async fn seq_runs_in_order_and_stops_at_first_error() {
        let trace = Arc::new(StdMutex::new(Vec::new()));
        let ok = seq([recording(&trace, "a", Ok(())), recording(&trace, "b", Ok(()))]);
        assert_eq!(ok.spawn(Context::background()).await, Ok(()));
        assert_eq!(*trace.lock().expect("trace"), vec!["a", "b"]);

        trace.lock().expect("trace").clear();
        let failing = seq([
            recording(&trace, "a", Err(TaskError::fail("test"))),
            recording(&trace, "b", Ok(())),
        ]);
        assert_eq!(failing.spawn(Context::background()).await, Err(TaskError::fail("test")));
        assert_eq!(*trace.lock().expect("trace"), vec!["a"]);
    }

    #[tokio::test]
    async fn ignore_err_always_succeeds() {
        let task = ignore_err(adapt::fallible(|| async { Err(TaskError::fail("test")) }));
        assert_eq!(task.spawn(Context::background()).await, Ok(()));
    }

    #[tokio::test]
    async fn sync_serializes_calls() {
        let lock = Arc::new(Mutex::new(()));
        let inside = Arc::new(AtomicU32::new(0));
        let max_inside = Arc::new(AtomicU32::new(0));
        let (inside_c, max_c) = (Arc::clone(&inside), Arc::clone(&max_inside));
        let task = sync(
            Arc::clone(&lock),
            adapt::unit(move || {
                let inside = Arc::clone(&inside_c);
                let max_inside = Arc::clone(&max_c);
                async move {
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                }
            }),
        );

        let calls: Vec<_> = (0..5)
            .map(|_| tokio::spawn(task.spawn(Context::background())))
            .collect();
        for call in calls {
            assert_eq!(call.await.expect("join"), Ok(()));
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(lock.try_lock().is_ok());
    }

    #[tokio::test]
    async fn sync_releases_lock_on_error() {
        let lock = Arc::new(Mutex::new(()));
        let task = sync(
            Arc::clone(&lock),
            adapt::fallible(|| async { Err(TaskError::fail("test")) }),
        );

        assert_eq!(task.spawn(Context::background()).await, Err(TaskError::fail("test")));
        assert!(lock.try_lock().is_ok());

        // A second failing call must not deadlock on the first one's lock.
        assert_eq!(task.spawn(Context::background()).await, Err(TaskError::fail("test")));
        assert!(lock.try_lock().is_ok());
    }

    #[tokio::test]
    async fn no_overlap_skips_while_running() {
        let release = Arc::new(Notify::new());
        let count = Arc::new(AtomicU32::new(0));
        let (release_c, counter) = (Arc::clone(&release), Arc::clone(&count));
        let task = no_overlap(TaskFn::arc(move |_ctx: Context| {
            counter.fetch_add(1, Ordering::SeqCst);
            let release = Arc::clone(&release_c);
            async move {
                release.notified().await;
                Ok(())
            }
        }));

        let first = tokio::spawn(task.spawn(Context::background()));
        for _ in 0..4 {
            assert_eq!(task.spawn(Context::background()).await, Ok(()));
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);

        release.notify_one();
        assert_eq!(first.await.expect("join"), Ok(()));

        // The flag is cleared once the running call is done.
        let again = tokio::spawn(task.spawn(Context::background()));
        tokio::task::yield_now().await;
        release.notify_one();
        assert_eq!(again.await.expect("join"), Ok(()));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn no_overlap_clears_flag_when_dropped() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let task = no_overlap(adapt::unit(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {}
        }));

        drop(task.spawn(Context::background()));
        assert_eq!(task.spawn(Context::background()).await, Ok(()));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
