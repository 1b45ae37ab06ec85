//! # Log sinks for the [`log`](crate::combinators::log) combinator.
//!
//! A [`LogSink`] receives two kinds of human-readable records: `info` before
//! each call and `error` after a call that did not succeed. Records arrive as
//! [`fmt::Arguments`] so a sink that filters them out never allocates.
//!
//! [`TracingSink`] forwards records to `tracing`; install a subscriber
//! (e.g. `tracing_subscriber::fmt()`) to see them.

use std::fmt;

/// Destination of the records written by the [`log`](crate::combinators::log) combinator.
pub trait LogSink: Send + Sync + 'static {
    /// Writes an informational record.
    fn info(&self, args: fmt::Arguments<'_>);

    /// Writes an error record.
    fn error(&self, args: fmt::Arguments<'_>);
}

/// Forwards records to `tracing` at `INFO` and `ERROR` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Creates a sink writing to the current `tracing` dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl LogSink for TracingSink {
    fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "tickvisor", "{args}");
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(target: "tickvisor", "{args}");
    }
}
