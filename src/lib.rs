//! # tickvisor
//!
//! **Tickvisor** runs named async tasks periodically on tokio.
//!
//! A [`PeriodicTask`] calls its task once on [`start`](PeriodicTask::start) and
//! then once per period, until it is [stopped](PeriodicTask::stop) or the task
//! fails. Invocations may overlap; combinators add single-flight, locking,
//! timeouts, retries and logging around any task.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  PeriodicTask::start()
//!        │
//!        ├─► TickerFactory(&Config) ──► Ticker ──► TickStream (single slot)
//!        │                                              │
//!        └─► supervising run ─► tick_loop ◄─────────────┘
//!                                  │
//!                                  ├─► spawn task.spawn(ctx) per tick (not awaited)
//!                                  │       ctx: task_name, attempt, deadline, cancellation
//!                                  │
//!                                  └─► first terminal condition:
//!                                        invocation error > closed stream > parent cancelled
//!
//!  PeriodicTask::stop()  ──► destroy ticker ──► stream closes ──► loop returns Stopped
//!                                                                └► ctx cancelled (cause Stopped)
//! ```
//!
//! ### Lifecycle
//! ```text
//! new/builder ──► Stopped ──start()──► Running ──stop()───────────► Stopped (error = Stopped)
//!                                         └──task returned Err(e)──► Stopped (error = e)
//! ```
//!
//! ## Features
//! | Area            | Description                                                 | Key types / functions                        |
//! |-----------------|-------------------------------------------------------------|----------------------------------------------|
//! | **Lifecycle**   | Restartable periodic execution with stop/wait/error.        | [`PeriodicTask`], [`PeriodicTaskBuilder`]    |
//! | **Engine**      | Turn any tick stream into concurrent invocations.           | [`tick_loop`], [`ticker::Ticker`]            |
//! | **Tasks**       | One canonical task shape plus named adapters.               | [`Task`], [`TaskFn`], [`adapt`]              |
//! | **Context**     | Cancellation with causes and typed per-call metadata.       | [`Context`], [`CancelHandle`]                |
//! | **Combinators** | seq, ignore_err, sync, no_overlap, timeout, retry, log.     | [`combinators`]                              |
//! | **Policies**    | Retry decisions and backoff delays.                         | [`RetryPolicy`], [`SimpleRetry`], [`BackoffRetry`] |
//! | **Errors**      | Typed errors for invocations and construction.              | [`TaskError`], [`BuildError`]                |
//! | **Configuration** | Period and missed-tick behavior; pluggable clocks.        | [`Config`], [`ticker::TickerFactory`], [`ManualClock`] |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tickvisor::combinators::{log, no_overlap, retry, timeout};
//! use tickvisor::{PeriodicTask, SimpleRetry, TaskError, TracingSink, adapt};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetch = adapt::fallible(|| async {
//!         // poll an upstream...
//!         Ok::<(), TaskError>(())
//!     });
//!
//!     let task = PeriodicTask::new(
//!         "fetch",
//!         Duration::from_secs(30),
//!         log(
//!             Arc::new(TracingSink::new()),
//!             "fetch",
//!             retry(SimpleRetry::new(3), timeout(Duration::from_secs(5), no_overlap(fetch))),
//!         ),
//!     )?;
//!
//!     task.start();
//!     tokio::time::sleep(Duration::from_millis(10)).await;
//!     task.stop();
//!     task.wait().await;
//!
//!     assert_eq!(task.error(), Some(TaskError::Stopped));
//!     Ok(())
//! }
//! ```
mod context;
mod core;
mod error;
mod tasks;

pub mod combinators;
pub mod policies;
pub mod sinks;
pub mod ticker;

// ---- Public re-exports ----

pub use context::{CancelGuard, CancelHandle, Context};
pub use core::{Config, PeriodicTask, PeriodicTaskBuilder, tick_loop};
pub use error::{BuildError, TaskError};
pub use policies::{BackoffPolicy, BackoffRetry, JitterPolicy, RetryPolicy, SimpleRetry};
pub use sinks::{LogSink, TracingSink};
pub use tasks::{BoxTaskFuture, Task, TaskFn, TaskRef, adapt};
pub use ticker::{ManualClock, TickDriver};
