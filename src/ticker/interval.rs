//! # Clock-driven tick source.
//!
//! [`IntervalTicker`] forwards ticks of a [`tokio::time::Interval`] into a
//! capacity-1 channel from a dedicated forwarder task.
//!
//! ## Rules
//! - The first tick is emitted immediately on creation.
//! - The forwarder blocks on the single slot; it never drops ticks itself.
//!   Coalescing of missed ticks is left to the interval's [`MissedTickBehavior`].
//! - A `stopped` flag is checked under the same mutex `destroy` takes, right
//!   before each hand-off, so nothing is sent after `destroy` returns.
//! - Dropping the ticker destroys it.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::select;
use tokio::sync::mpsc;
use tokio::time::{self, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{Tick, TickStream, Ticker};

/// State shared between the ticker handle and its forwarder.
#[derive(Debug)]
struct Shared {
    stopped: Mutex<bool>,
    token: CancellationToken,
}

/// Tick source backed by a tokio interval.
#[derive(Debug)]
pub struct IntervalTicker {
    stream: Option<TickStream>,
    shared: Arc<Shared>,
}

impl IntervalTicker {
    /// Creates a ticker with the default [`MissedTickBehavior::Skip`].
    ///
    /// # Panics
    /// Panics if `period` is zero or if called outside of a tokio runtime.
    pub fn new(period: Duration) -> Self {
        Self::with_missed_ticks(period, MissedTickBehavior::Skip)
    }

    /// Creates a ticker that coalesces missed ticks according to `behavior`.
    ///
    /// # Panics
    /// Panics if `period` is zero or if called outside of a tokio runtime.
    pub fn with_missed_ticks(period: Duration, behavior: MissedTickBehavior) -> Self {
        assert!(!period.is_zero(), "tick period must be non-zero");

        let (tx, rx) = mpsc::channel(1);
        let shared = Arc::new(Shared {
            stopped: Mutex::new(false),
            token: CancellationToken::new(),
        });

        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(behavior);
        tokio::spawn(forward(interval, tx, Arc::clone(&shared)));

        Self {
            stream: Some(rx),
            shared,
        }
    }
}

impl Ticker for IntervalTicker {
    fn take_stream(&mut self) -> Option<TickStream> {
        self.stream.take()
    }

    fn destroy(&mut self) {
        let mut stopped = self
            .shared
            .stopped
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *stopped {
            return;
        }
        *stopped = true;
        self.shared.token.cancel();
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Moves interval ticks into the slot until destroyed.
///
/// Exiting drops the sender, which is what closes the stream.
async fn forward(mut interval: Interval, tx: mpsc::Sender<Tick>, shared: Arc<Shared>) {
    loop {
        let at = select! {
            biased;
            _ = shared.token.cancelled() => break,
            at = interval.tick() => at,
        };

        let permit = select! {
            biased;
            _ = shared.token.cancelled() => break,
            permit = tx.reserve() => match permit {
                Ok(permit) => permit,
                Err(_closed) => break,
            },
        };

        {
            let stopped = shared.stopped.lock().unwrap_or_else(PoisonError::into_inner);
            if *stopped {
                break;
            }
            permit.send(at);
        }
    }
}
