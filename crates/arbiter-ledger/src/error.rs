//! Error types for ledger operations.
//!
//! Every variant is a local validation failure on a single operation.
//! Mutating operations check before they act, so an error always means
//! the ledger was left untouched.

use thiserror::Error;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors returned by [`ResourceLedger`](crate::ResourceLedger) and the
/// [`recovery`](crate::recovery) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A process with this pid is already registered.
    #[error("process {pid} already exists")]
    AlreadyExists {
        /// The duplicate pid
        pid: String,
    },

    /// A resource vector does not have one entry per resource type.
    #[error("vector has {actual} entries, ledger tracks {expected} resource types")]
    DimensionMismatch {
        /// Number of resource types in the ledger
        expected: usize,
        /// Length of the offending vector
        actual: usize,
    },

    /// A declared maximum (or a restored checkpoint) does not fit the
    /// capacity of a resource type.
    #[error("process {pid}: {requested} units of resource {resource} exceed capacity {capacity}")]
    ExceedsCapacity {
        /// Process being created or restored
        pid: String,
        /// Resource type index
        resource: usize,
        /// Units asked for
        requested: u32,
        /// Units that could be held
        capacity: u32,
    },

    /// No process with this pid is registered.
    #[error("unknown process {pid}")]
    UnknownProcess {
        /// The missing pid
        pid: String,
    },

    /// A request asks for more than the process may still claim.
    #[error("process {pid} requested {requested} units of resource {resource}, remaining need is {need}")]
    ExceedsDeclaredNeed {
        /// Requesting process
        pid: String,
        /// Resource type index
        resource: usize,
        /// Units requested
        requested: u32,
        /// `maximum - allocation` at the time of the request
        need: u32,
    },

    /// A release gives back more than the process holds.
    #[error("process {pid} released {requested} units of resource {resource}, holds {allocated}")]
    ExceedsAllocation {
        /// Releasing process
        pid: String,
        /// Resource type index
        resource: usize,
        /// Units released
        requested: u32,
        /// Units currently held
        allocated: u32,
    },

    /// Rollback was asked for a process that never saved a checkpoint.
    #[error("process {pid} has no checkpoint")]
    NoCheckpoint {
        /// Process without a checkpoint
        pid: String,
    },
}

impl LedgerError {
    pub(crate) fn unknown(pid: &str) -> Self {
        Self::UnknownProcess {
            pid: pid.to_string(),
        }
    }
}
