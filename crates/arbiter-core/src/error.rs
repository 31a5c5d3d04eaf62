//! Error types for the Arbiter facade.

use thiserror::Error;

/// Core error type for arbiter operations.
#[derive(Debug, Error)]
pub enum ArbiterError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ledger error passthrough.
    #[error("Ledger error: {0}")]
    Ledger(#[from] arbiter_ledger::LedgerError),

    /// Monitor error passthrough.
    #[error("Monitor error: {0}")]
    Monitor(#[from] arbiter_monitor::MonitorError),

    /// `start_monitor` called while a monitor is running.
    #[error("Deadlock monitor already running")]
    MonitorAlreadyRunning,
}
