//! # PeriodicTask: restartable lifecycle around one tick loop.
//!
//! A [`PeriodicTask`] owns at most one ticker and one supervising run of the
//! tick loop at a time.
//!
//! ## States
//! ```text
//!            start()                         stop() / task error
//! Stopped ───────────► Running ─────────────────────────────► Stopped
//!   ▲  error() = last cause    error() = None                  │
//!   └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Architecture
//! ```text
//! start()
//!   ├─► ticker = factory(&cfg)
//!   └─► tracker.spawn(supervise)
//!          ├─► tick_loop(ticks, ctx{task_name}, Supervised(task))
//!          │       └─► tracker.spawn(invocation) per tick
//!          └─► finish(generation, terminal)
//!                 ├─► record terminal cause (if none recorded yet)
//!                 └─► destroy ticker (engine-initiated stop)
//! ```
//!
//! ## Rules
//! - `start()` on a running task and `stop()` on a stopped task are no-ops.
//! - The state lock guards the ticker handle and the recorded error; it is
//!   never held across a call into the task.
//! - Context errors, and errors returned after the run was cancelled, never
//!   stop the task.
//! - Each run has a generation number, so a late `finish` of an old run never
//!   touches a newer one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::{debug, trace, warn};

use crate::context::Context;
use crate::core::builder::PeriodicTaskBuilder;
use crate::core::config::Config;
use crate::core::tick_loop;
use crate::error::{BuildError, TaskError};
use crate::tasks::{BoxTaskFuture, Task, TaskRef};
use crate::ticker::{TickStream, Ticker, TickerFactory};

/// Guarded lifecycle state.
struct State {
    ticker: Option<Box<dyn Ticker>>,
    err: Option<TaskError>,
    generation: u64,
}

struct Inner {
    name: Arc<str>,
    cfg: Config,
    task: TaskRef,
    ticker_factory: TickerFactory,
    runtime: Handle,
    tracker: TaskTracker,
    state: Mutex<State>,
}

/// Named task that runs on start and then once per period, until stopped or failed.
///
/// Cheap to clone: clones are handles to the same task.
///
/// # Example
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use std::time::Duration;
/// use tickvisor::{PeriodicTask, TaskError, adapt};
///
/// let task = PeriodicTask::new("heartbeat", Duration::from_secs(30), adapt::unit(|| async {
///     // send heartbeat...
/// }))?;
///
/// task.start();
/// assert_eq!(task.error(), None);
///
/// task.stop();
/// task.wait().await;
/// assert_eq!(task.error(), Some(TaskError::Stopped));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PeriodicTask {
    inner: Arc<Inner>,
}

impl PeriodicTask {
    /// Creates a stopped task calling `task` on start and then every `period`.
    ///
    /// Must be called inside a tokio runtime; the task runs on that runtime.
    pub fn new(
        name: impl Into<Arc<str>>,
        period: Duration,
        task: TaskRef,
    ) -> Result<Self, BuildError> {
        Self::builder(name).period(period).task(task).build()
    }

    /// Returns a builder for a task called `name`.
    pub fn builder(name: impl Into<Arc<str>>) -> PeriodicTaskBuilder {
        PeriodicTaskBuilder::new(name)
    }

    pub(crate) fn from_parts(
        name: Arc<str>,
        cfg: Config,
        task: TaskRef,
        ticker_factory: TickerFactory,
        runtime: Handle,
    ) -> Self {
        let tracker = TaskTracker::new();
        // A closed tracker still accepts tasks; closing only arms `wait()`.
        tracker.close();

        Self {
            inner: Arc::new(Inner {
                name,
                cfg,
                task,
                ticker_factory,
                runtime,
                tracker,
                state: Mutex::new(State {
                    ticker: None,
                    err: None,
                    generation: 0,
                }),
            }),
        }
    }

    /// Task name, as propagated to invocations through [`Context::task_name`].
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Time between ticks.
    pub fn period(&self) -> Duration {
        self.inner.cfg.period
    }

    /// Returns `true` while a ticker is active.
    pub fn is_running(&self) -> bool {
        self.inner.lock().ticker.is_some()
    }

    /// Starts (or restarts) periodic execution. No-op on a running task.
    ///
    /// The first invocation happens right away, without waiting for a period.
    pub fn start(&self) {
        let mut state = self.inner.lock();
        if state.ticker.is_some() {
            return;
        }

        let _runtime = self.inner.runtime.enter();
        let mut ticker = (self.inner.ticker_factory)(&self.inner.cfg);
        let Some(ticks) = ticker.take_stream() else {
            warn!(task = %self.inner.name, "ticker handed out no stream; not starting");
            ticker.destroy();
            return;
        };

        state.err = None;
        state.generation += 1;
        let generation = state.generation;
        state.ticker = Some(ticker);

        self.inner
            .tracker
            .spawn(supervise(Arc::clone(&self.inner), ticks, generation));
        debug!(
            task = %self.inner.name,
            period = ?self.inner.cfg.period,
            generation,
            "periodic task started"
        );
    }

    /// Stops periodic execution. No-op on a stopped task.
    ///
    /// Does not wait for running invocations; use [`wait`](Self::wait) for that.
    /// Records [`TaskError::Stopped`] unless a failure was recorded first.
    pub fn stop(&self) {
        let mut state = self.inner.lock();
        let Some(mut ticker) = state.ticker.take() else {
            return;
        };
        ticker.destroy();
        if state.err.is_none() {
            state.err = Some(TaskError::Stopped);
        }
        debug!(task = %self.inner.name, generation = state.generation, "periodic task stopped");
    }

    /// Resolves once the supervising run and every spawned invocation have finished.
    ///
    /// On a running task this waits until it is stopped (or fails) and drained.
    pub async fn wait(&self) {
        self.inner.tracker.wait().await;
    }

    /// Why the task last terminated; `None` while it runs cleanly.
    ///
    /// [`TaskError::Stopped`] after [`stop`](Self::stop), or the task's own
    /// error after an engine-initiated stop.
    pub fn error(&self) -> Option<TaskError> {
        self.inner.lock().err.clone()
    }
}

impl std::fmt::Debug for PeriodicTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicTask")
            .field("name", &self.inner.name)
            .field("period", &self.inner.cfg.period)
            .field("running", &self.is_running())
            .finish()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the terminal cause of run `generation` and tears its ticker down.
    fn finish(&self, generation: u64, terminal: TaskError) {
        let mut state = self.lock();
        if state.generation != generation {
            return;
        }
        if state.err.is_none() {
            state.err = Some(terminal.clone());
        }
        if let Some(mut ticker) = state.ticker.take() {
            ticker.destroy();
            warn!(
                task = %self.name,
                error = %terminal,
                label = terminal.as_label(),
                "periodic task stopped itself"
            );
        }
    }
}

/// Supervising run: drives the tick loop and records how it ended.
async fn supervise(inner: Arc<Inner>, ticks: TickStream, generation: u64) {
    let ctx = Context::background().with_task_name(Arc::clone(&inner.name));
    let task: TaskRef = Arc::new(Supervised {
        name: Arc::clone(&inner.name),
        task: Arc::clone(&inner.task),
    });

    let terminal = tick_loop::run(ticks, &ctx, task, Some(&inner.tracker)).await;
    debug!(task = %inner.name, generation, terminal = %terminal, "tick loop finished");
    inner.finish(generation, terminal);
}

/// Filters invocation errors that must not stop the task.
struct Supervised {
    name: Arc<str>,
    task: TaskRef,
}

impl Task for Supervised {
    fn spawn(&self, ctx: Context) -> BoxTaskFuture {
        let fut = self.task.spawn(ctx.clone());
        let name = Arc::clone(&self.name);
        Box::pin(async move {
            match fut.await {
                Err(err) if err.is_context_error() || ctx.is_cancelled() => {
                    trace!(task = %name, error = %err, "ignoring invocation error");
                    Ok(())
                }
                res => res,
            }
        })
    }
}
