use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::{
    core::Config,
    error::BuildError,
    tasks::TaskRef,
    ticker::{TickerFactory, interval_factory},
};
use super::periodic::PeriodicTask;

/// Builder for constructing a [`PeriodicTask`] with optional features.
pub struct PeriodicTaskBuilder {
    name: Arc<str>,
    cfg: Config,
    task: Option<TaskRef>,
    ticker: Option<TickerFactory>,
}

impl PeriodicTaskBuilder {
    /// Creates a new builder for a task called `name` with the default configuration.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            cfg: Config::default(),
            task: None,
            ticker: None,
        }
    }

    /// Sets the time between ticks.
    pub fn period(mut self, period: Duration) -> Self {
        self.cfg.period = period;
        self
    }

    /// Replaces the whole clock configuration.
    pub fn config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the function invoked on every tick.
    pub fn task(mut self, task: TaskRef) -> Self {
        self.task = Some(task);
        self
    }

    /// Replaces the tick source.
    ///
    /// Defaults to [`interval_factory`]. Tests typically pass
    /// [`ManualClock::factory`](crate::ticker::ManualClock::factory).
    pub fn ticker(mut self, factory: TickerFactory) -> Self {
        self.ticker = Some(factory);
        self
    }

    /// Builds a stopped periodic task bound to the current tokio runtime.
    ///
    /// Fails when the period is zero, no task was given, or no runtime is active.
    pub fn build(self) -> Result<PeriodicTask, BuildError> {
        self.cfg.validate(&self.name)?;
        let task = self.task.ok_or_else(|| BuildError::MissingTask {
            name: Arc::clone(&self.name),
        })?;
        let runtime = Handle::try_current().map_err(|_| BuildError::NoRuntime {
            name: Arc::clone(&self.name),
        })?;

        Ok(PeriodicTask::from_parts(
            self.name,
            self.cfg,
            task,
            self.ticker.unwrap_or_else(interval_factory),
            runtime,
        ))
    }
}
