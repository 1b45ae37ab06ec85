//! # Task abstractions.
//!
//! This module provides the task-related types:
//! - [`Task`] - trait for implementing async cancelable tasks
//! - [`TaskFn`] - function-backed task implementation (canonical shape)
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`adapt`] - named adapters for the simpler function shapes

pub mod adapt;
mod task;
mod task_fn;

pub use task::{BoxTaskFuture, Task, TaskRef};
pub use task_fn::TaskFn;
