//! src/worker/config.rs
//!
//! Configuration for worker behaviour.
//!
//! Example:
//! ```
//! use std::time::Duration;
//! use thread_toolkit::worker::{RunMode, WorkerConfig};
//!
//! let config = WorkerConfig::builder()
//!     .name("indexer")
//!     .mode(RunMode::Loop)
//!     .period(Duration::from_millis(10))
//!     .build();
//! assert_eq!(config.name, "indexer");
//! ```

use std::time::Duration;

/// Default pacing interval between loop iterations.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(50);

/// How a worker executes its unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Execute the work exactly once, then let the thread exit.
    Once,
    /// Repeat the work on a fixed period until stopped.
    Loop,
}

/// Configuration for a [`Worker`](crate::worker::Worker).
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name given to the OS thread (visible in debuggers and process tools).
    pub name: String,
    /// Whether the work runs once or repeats on a period.
    pub mode: RunMode,
    /// Pacing interval for [`RunMode::Loop`]. Measured from iteration start
    /// to iteration start; work that overruns the period is not delayed
    /// further. Ignored in [`RunMode::Once`].
    pub period: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "worker".to_string(),
            mode: RunMode::Once,
            period: DEFAULT_PERIOD,
        }
    }
}

impl WorkerConfig {
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder::default()
    }
}

/// Builder for [`WorkerConfig`] with method chaining.
#[derive(Default)]
pub struct WorkerConfigBuilder {
    config: WorkerConfig,
}

impl WorkerConfigBuilder {
    /// Set the thread name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the run mode.
    pub fn mode(mut self, mode: RunMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the loop pacing period.
    ///
    /// - Too low: more wake-ups, higher CPU usage.
    /// - Too high: slower reaction to newly available work.
    pub fn period(mut self, period: Duration) -> Self {
        self.config.period = period;
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> WorkerConfig {
        self.config
    }
}
