//! # Deadlock Monitor
//!
//! Circular-wait detection over [`arbiter_ledger`] snapshots.
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`WaitForGraph`] | Who waits on whom, derived from the wait queue |
//! | [`WaitCycle`] | A closed wait loop, identified by its member set |
//! | [`EdgeTrigger`] | Turns "deadlocked" levels into one-shot edges |
//! | [`DeadlockMonitor`] | Polling loop publishing [`DeadlockAlert`]s |
//! | [`SnapshotSource`] | What the monitor polls; implemented by the ledger |
//!
//! ## Quick Start
//!
//! ```rust
//! use arbiter_ledger::ResourceLedger;
//! use arbiter_monitor::WaitForGraph;
//!
//! let ledger = ResourceLedger::new(vec![1]);
//! ledger.add_process("P0", &[1], 0)?;
//! ledger.add_process("P1", &[1], 0)?;
//! ledger.request_resources("P0", &[1])?;
//! ledger.request_resources("P1", &[1])?;
//!
//! let graph = WaitForGraph::from_snapshot(&ledger.snapshot()).unwrap();
//! assert!(graph.waits_on("P1", "P0"));
//! assert!(graph.find_cycles().is_empty());
//! # Ok::<(), arbiter_ledger::LedgerError>(())
//! ```
//!
//! ## References
//!
//! - Holt, R. C. (1972). "Some Deadlock Properties of Computer Systems"
//!   *ACM Computing Surveys*, 4(3), 179-196.

mod edge;
mod error;
mod monitor;
mod wfg;

pub use edge::{EdgeTransition, EdgeTrigger};
pub use error::{MonitorError, Result};
pub use monitor::{
    alert_channel, DeadlockAlert, DeadlockMonitor, DeadlockMonitorConfig, MonitorHandle,
    SnapshotSource,
};
pub use wfg::{WaitCycle, WaitForGraph};
