//! # Example: tick_tack
//!
//! Two periodic tasks sharing one lock: `tick` every second, `tack` every
//! 1.5 seconds, each logged through [`TracingSink`]. `tack` fails on its fourth
//! call, which stops it; `tick` is stopped by hand after five seconds.
//!
//! ## Flow
//! ```text
//! t=0.0  Calling tick   Calling tack
//! t=1.0  Calling tick
//! t=1.5                 Calling tack
//! ...
//! t=4.5                 Calling tack → Err("tack #4") → tack stops itself
//! t=5.0  stop(tick) → error() = Stopped
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=tickvisor=debug cargo run --example tick_tack
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tickvisor::combinators::{log, sync};
use tickvisor::{PeriodicTask, TaskError, TracingSink, adapt};
use tokio::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Logging: RUST_LOG wins, otherwise info for everything.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let sink = Arc::new(TracingSink::new());
    let lock = Arc::new(Mutex::new(()));

    // 2. tick: never fails.
    let tick = PeriodicTask::new(
        "tick",
        Duration::from_secs(1),
        log(
            sink.clone(),
            "tick",
            sync(Arc::clone(&lock), adapt::unit(|| async { println!("tick") })),
        ),
    )?;

    // 3. tack: fails on the fourth call.
    let calls = Arc::new(AtomicU32::new(0));
    let tack = PeriodicTask::new(
        "tack",
        Duration::from_millis(1500),
        log(
            sink.clone(),
            "tack",
            sync(
                Arc::clone(&lock),
                adapt::fallible(move || {
                    let n = calls.fetch_add(1, Ordering::Relaxed) + 1;
                    async move {
                        println!("tack");
                        if n == 4 {
                            return Err(TaskError::fail(format!("tack #{n}")));
                        }
                        Ok(())
                    }
                }),
            ),
        ),
    )?;

    tick.start();
    tack.start();

    tokio::time::sleep(Duration::from_secs(5)).await;
    tick.stop();

    tick.wait().await;
    tack.stop();
    tack.wait().await;

    println!("tick: {:?}", tick.error());
    println!("tack: {:?}", tack.error());
    Ok(())
}
