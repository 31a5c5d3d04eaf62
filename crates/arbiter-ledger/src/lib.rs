//! # Arbiter Ledger
//!
//! Multi-resource allocation state with deadlock avoidance and recovery.
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`ResourceLedger`] | Allocations, maxima, wait queue under one lock |
//! | [`LedgerSnapshot`] | Owned, consistent copy for lock-free analysis |
//! | [`safety`] | Banker's safety algorithm and grant simulation |
//! | [`recovery`] | Preemption, termination, checkpoint and rollback |
//!
//! ## Quick Start
//!
//! ```rust
//! use arbiter_ledger::{RequestStatus, ResourceLedger};
//!
//! let ledger = ResourceLedger::new(vec![10, 5, 7]);
//! ledger.add_process("P0", &[7, 5, 3], 0)?;
//!
//! let outcome = ledger.request_safely("P0", &[0, 1, 0])?;
//! assert_eq!(outcome.status, RequestStatus::Granted);
//! assert_eq!(ledger.available(), vec![10, 4, 7]);
//! # Ok::<(), arbiter_ledger::LedgerError>(())
//! ```
//!
//! ## Invariants
//!
//! - `allocation[i] <= maximum[i]` for every live process
//! - `Σ allocation[i] <= total[i]` for every resource type
//! - A failed operation leaves the ledger unchanged

mod error;
mod ledger;
mod process;
mod snapshot;

pub mod recovery;
pub mod safety;

pub use error::{LedgerError, Result};
pub use ledger::{RequestStatus, ResourceLedger, SafeRequest};
pub use process::{ProcessMeta, WaitEntry};
pub use safety::SafetyReport;
pub use snapshot::LedgerSnapshot;
