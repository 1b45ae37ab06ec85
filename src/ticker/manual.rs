//! # Manually driven tick source.
//!
//! [`ManualTicker`] is a bare capacity-1 stream without a clock: ticks are
//! injected through a [`TickDriver`]. Destroying the ticker closes the stream.
//!
//! [`ManualClock`] plugs manual tickers into a periodic task, so a test can
//! tick whichever run is currently active:
//!
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::time::Duration;
//! use tickvisor::{ManualClock, PeriodicTask, adapt};
//!
//! let clock = ManualClock::new();
//! let task = PeriodicTask::builder("manual")
//!     .period(Duration::from_secs(3600))
//!     .ticker(clock.factory())
//!     .task(adapt::unit(|| async {}))
//!     .build()?;
//!
//! task.start();
//! clock.tick().await?;
//! task.stop();
//! task.wait().await;
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tokio::select;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::{TickStream, Ticker, TickerFactory};
use crate::core::Config;
use crate::error::TaskError;

/// Tick source driven by explicit [`TickDriver::tick`] calls.
#[derive(Debug)]
pub struct ManualTicker {
    tx: Option<mpsc::Sender<Instant>>,
    stream: Option<TickStream>,
    destroyed: CancellationToken,
}

impl Default for ManualTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualTicker {
    /// Creates a live ticker with an empty slot.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self {
            tx: Some(tx),
            stream: Some(rx),
            destroyed: CancellationToken::new(),
        }
    }

    /// Returns a driver that injects ticks into this ticker.
    ///
    /// The driver does not keep the stream open: once the ticker is destroyed,
    /// [`TickDriver::tick`] fails with [`TaskError::Stopped`], including a call
    /// already waiting on the slot.
    pub fn driver(&self) -> TickDriver {
        TickDriver {
            tx: self.tx.as_ref().map(mpsc::Sender::downgrade),
            destroyed: self.destroyed.clone(),
        }
    }
}

impl Ticker for ManualTicker {
    fn take_stream(&mut self) -> Option<TickStream> {
        self.stream.take()
    }

    fn destroy(&mut self) {
        self.destroyed.cancel();
        self.tx = None;
    }
}

/// Injects ticks into a [`ManualTicker`].
#[derive(Clone, Debug)]
pub struct TickDriver {
    tx: Option<mpsc::WeakSender<Instant>>,
    destroyed: CancellationToken,
}

impl TickDriver {
    /// Delivers one tick, waiting while the slot is still occupied.
    ///
    /// A tick still waiting when the ticker is destroyed is dropped and the call
    /// fails with [`TaskError::Stopped`].
    pub async fn tick(&self) -> Result<(), TaskError> {
        if self.destroyed.is_cancelled() {
            return Err(TaskError::Stopped);
        }
        let tx = self
            .tx
            .as_ref()
            .and_then(mpsc::WeakSender::upgrade)
            .ok_or(TaskError::Stopped)?;
        select! {
            biased;
            _ = self.destroyed.cancelled() => Err(TaskError::Stopped),
            res = tx.send(Instant::now()) => res.map_err(|_closed| TaskError::Stopped),
        }
    }
}

/// Factory of [`ManualTicker`]s that remembers the latest one's driver.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    current: Arc<Mutex<Option<TickDriver>>>,
}

impl ManualClock {
    /// Creates a clock with no ticker yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a ticker factory for [`PeriodicTaskBuilder::ticker`](crate::PeriodicTaskBuilder::ticker).
    pub fn factory(&self) -> TickerFactory {
        let current = Arc::clone(&self.current);
        Arc::new(move |_cfg: &Config| {
            let ticker = ManualTicker::new();
            *current.lock().unwrap_or_else(PoisonError::into_inner) = Some(ticker.driver());
            Box::new(ticker) as Box<dyn Ticker>
        })
    }

    /// Ticks the most recently created ticker.
    ///
    /// Fails with [`TaskError::Stopped`] if there is none or it was destroyed.
    pub async fn tick(&self) -> Result<(), TaskError> {
        let driver = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(TaskError::Stopped)?;
        driver.tick().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_injected_ticks_until_destroyed() {
        let mut ticker = ManualTicker::new();
        let driver = ticker.driver();
        let mut ticks = ticker.take_stream().expect("stream");

        let consumer = tokio::spawn(async move {
            let mut n = 0;
            while ticks.recv().await.is_some() {
                n += 1;
            }
            n
        });

        driver.tick().await.expect("first tick");
        driver.tick().await.expect("second tick");
        ticker.destroy();

        assert_eq!(consumer.await.expect("consumer task"), 2);
        assert_eq!(driver.tick().await, Err(TaskError::Stopped));
    }

    #[tokio::test]
    async fn destroy_drops_a_waiting_tick() {
        let mut ticker = ManualTicker::new();
        let driver = ticker.driver();
        let mut ticks = ticker.take_stream().expect("stream");

        driver.tick().await.expect("first tick fills the slot");
        let waiting = tokio::spawn({
            let driver = driver.clone();
            async move { driver.tick().await }
        });
        tokio::task::yield_now().await;
        ticker.destroy();

        assert_eq!(waiting.await.expect("waiting tick"), Err(TaskError::Stopped));
        let mut delivered = 0;
        while ticks.recv().await.is_some() {
            delivered += 1;
        }
        assert_eq!(delivered, 1);
    }

    #[tokio::test]
    async fn clock_without_ticker_is_stopped() {
        let clock = ManualClock::new();
        assert_eq!(clock.tick().await, Err(TaskError::Stopped));

        let mut ticker = (clock.factory())(&Config::default());
        let mut ticks = ticker.take_stream().expect("stream");
        clock.tick().await.expect("tick");
        assert!(ticks.recv().await.is_some());
    }
}
