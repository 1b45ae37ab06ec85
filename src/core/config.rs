//! # Periodic task configuration.
//!
//! Provides [`Config`], the clock settings of a [`PeriodicTask`](crate::PeriodicTask).
//!
//! Config is used in two ways:
//! 1. **Task creation**: `PeriodicTask::builder(name).config(cfg)`
//! 2. **Ticker factories**: every [`TickerFactory`](crate::ticker::TickerFactory) receives it
//!
//! ## Validation
//! - `period = 0s` is rejected by [`Config::validate`] (and thus by the builder).

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::error::BuildError;

/// Clock settings of a periodic task.
///
/// ## Field semantics
/// - `period`: Time between ticks; the first tick is always immediate
/// - `missed_ticks`: How the interval clock coalesces ticks the consumer fell behind on
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Time between two ticks.
    pub period: Duration,

    /// Coalescing of missed ticks by the underlying interval.
    ///
    /// The tick source itself never drops ticks; it blocks on its single slot.
    /// While it is blocked the interval keeps running, and this decides what
    /// happens to the ticks that elapsed in the meantime.
    pub missed_ticks: MissedTickBehavior,
}

impl Config {
    /// Creates a config with the given period and default missed-tick behavior.
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }

    /// Checks the config on behalf of the task called `name`.
    pub fn validate(&self, name: &Arc<str>) -> Result<(), BuildError> {
        if self.period.is_zero() {
            return Err(BuildError::ZeroPeriod {
                name: Arc::clone(name),
            });
        }
        Ok(())
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `period = 1s`
    /// - `missed_ticks = Skip` (late ticks collapse into the next period boundary)
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            missed_ticks: MissedTickBehavior::Skip,
        }
    }
}
