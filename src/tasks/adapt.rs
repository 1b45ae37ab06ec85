//! # Adapters for the simpler function shapes.
//!
//! The canonical shape is `Fn(Context) -> Future<Output = Result<(), TaskError>>`
//! ([`TaskFn::arc`]). The helpers below lift the other accepted shapes into it,
//! picked explicitly at the call site:
//!
//! | Shape                                        | Adapter          |
//! |----------------------------------------------|------------------|
//! | `Fn() -> Future<Output = ()>`                | [`unit`]         |
//! | `Fn() -> Future<Output = Result<(), TaskError>>` | [`fallible`] |
//! | `Fn(Context) -> Future<Output = ()>`         | [`contextual`]   |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use tickvisor::{TaskRef, adapt};
//!
//! let hits = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&hits);
//! let task: TaskRef = adapt::unit(move || {
//!     let counter = Arc::clone(&counter);
//!     async move {
//!         counter.fetch_add(1, Ordering::Relaxed);
//!     }
//! });
//! # let _ = task;
//! ```

use std::future::Future;

use crate::context::Context;
use crate::error::TaskError;
use crate::tasks::{TaskFn, TaskRef};

/// Lifts `Fn() -> impl Future<Output = ()>`; the task never fails.
pub fn unit<F, Fut>(f: F) -> TaskRef
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    TaskFn::arc(move |_ctx: Context| {
        let fut = f();
        async move {
            fut.await;
            Ok(())
        }
    })
}

/// Lifts `Fn() -> impl Future<Output = Result<(), TaskError>>`; the context is ignored.
pub fn fallible<F, Fut>(f: F) -> TaskRef
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    TaskFn::arc(move |_ctx: Context| f())
}

/// Lifts `Fn(Context) -> impl Future<Output = ()>`; the task never fails.
pub fn contextual<F, Fut>(f: F) -> TaskRef
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    TaskFn::arc(move |ctx: Context| {
        let fut = f(ctx);
        async move {
            fut.await;
            Ok(())
        }
    })
}
