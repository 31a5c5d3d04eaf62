//! Error types for deadlock analysis and monitoring.

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors that can occur while analyzing a snapshot or running the monitor.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The snapshot is internally inconsistent.
    ///
    /// The background monitor skips the tick and keeps polling.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// The monitor task panicked or was cancelled.
    #[error("monitor task failed: {0}")]
    TaskFailed(String),

    /// No tokio runtime was available to run the monitor on.
    #[error("no tokio runtime available: {0}")]
    NoRuntime(String),
}
