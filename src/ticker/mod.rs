//! Tick sources.
//!
//! A tick source owns a single-slot stream of [`Tick`]s and can be destroyed.
//! The periodic task creates one per run through a [`TickerFactory`].
//!
//! ## Contents
//! - [`Ticker`] the two-operation contract (`take_stream`, `destroy`)
//! - [`IntervalTicker`] clock-driven source: one tick immediately, then one per period
//! - [`ManualTicker`] / [`TickDriver`] deterministic source driven explicitly
//! - [`ManualClock`] factory of manual tickers, for driving a whole periodic task
//!
//! ## Delivery
//! ```text
//! clock ──► forwarder ──► [slot: capacity 1] ──► tick loop
//!              │                  ▲
//!              └── waits here ────┘ until the previous tick is drained
//! ```

mod interval;
mod manual;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::core::Config;

pub use interval::IntervalTicker;
pub use manual::{ManualClock, ManualTicker, TickDriver};

/// A scheduling signal; only its occurrence and order matter.
pub type Tick = tokio::time::Instant;

/// Single-slot delivery stream of ticks. `recv()` yields `None` once the source is destroyed.
pub type TickStream = mpsc::Receiver<Tick>;

/// Builds a fresh ticker for every run of a periodic task.
pub type TickerFactory = Arc<dyn Fn(&Config) -> Box<dyn Ticker> + Send + Sync>;

/// # Owner of a tick stream.
///
/// A ticker is single-owner: only the periodic task (or test) that created it
/// calls [`destroy`](Ticker::destroy).
pub trait Ticker: Send + 'static {
    /// Hands out the delivery stream. Returns `Some` exactly once.
    fn take_stream(&mut self) -> Option<TickStream>;

    /// Stops producing ticks and closes the stream.
    ///
    /// A consumer blocked on the stream observes closure instead of hanging.
    /// Calling it again is a no-op.
    fn destroy(&mut self);
}

/// Default factory: an [`IntervalTicker`] honoring the config's period and missed-tick behavior.
pub fn interval_factory() -> TickerFactory {
    Arc::new(|cfg: &Config| {
        Box::new(IntervalTicker::with_missed_ticks(cfg.period, cfg.missed_ticks)) as Box<dyn Ticker>
    })
}
