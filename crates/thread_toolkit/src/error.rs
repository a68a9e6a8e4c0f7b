//! src/error.rs
//!
//! Error types surfaced by the toolkit.
//!
//! Every fallible operation in this crate is synchronous and returns a status;
//! nothing panics as part of its contract. The taxonomy is:
//!
//! - Misuse errors (`AlreadyRunning`, `NotRunning`, `ShuttingDown`): fully
//!   recoverable, no state is corrupted. The call is a no-op beyond the
//!   returned code and a log line.
//! - `SpawnFailed`: the OS refused to create a thread. The toolkit does not
//!   retry; callers should treat this as fatal.
//! - `Timeout`: a bounded wait elapsed before its condition held.
//! - `Undefined`: catch-all for conditions that do not fit the above.

use std::time::Duration;
use thiserror::Error;

use crate::queue::PopError;

/// Convenience alias used across the crate.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

/// Errors produced by workers, pools, and queues.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CoreError {
    /// `start()` was called while a worker thread is still live.
    #[error("worker is already running")]
    AlreadyRunning,

    /// `stop()` was called without a prior successful `start()`.
    #[error("worker is not running")]
    NotRunning,

    /// `submit()` was called on a pool whose shutdown flag is set.
    #[error("pool is shutting down")]
    ShuttingDown,

    /// A bounded wait elapsed before its condition held.
    #[error("operation timed out after {timeout:?}")]
    Timeout {
        /// The wait bound that was exceeded.
        timeout: Duration,
    },

    /// The OS could not create a thread. Not retried by the toolkit.
    #[error("failed to spawn worker thread: {source}")]
    SpawnFailed {
        #[source]
        source: std::io::Error,
    },

    /// Catch-all for conditions outside the fixed taxonomy.
    #[error("{0}")]
    Undefined(String),
}

impl CoreError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            CoreError::AlreadyRunning => "already_running",
            CoreError::NotRunning => "not_running",
            CoreError::ShuttingDown => "shutting_down",
            CoreError::Timeout { .. } => "timeout",
            CoreError::SpawnFailed { .. } => "spawn_failed",
            CoreError::Undefined(_) => "undefined",
        }
    }

    /// Indicates whether the error is a recoverable misuse of the API
    /// (as opposed to resource exhaustion).
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            CoreError::AlreadyRunning | CoreError::NotRunning | CoreError::ShuttingDown
        )
    }
}

impl From<PopError> for CoreError {
    fn from(err: PopError) -> Self {
        match err {
            PopError::Timeout { timeout } => CoreError::Timeout { timeout },
            PopError::Empty => CoreError::Undefined("queue is empty".into()),
            PopError::Closed => CoreError::Undefined("queue is closed".into()),
        }
    }
}
