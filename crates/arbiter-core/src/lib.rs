//! # Arbiter Core
//!
//! Deadlock avoidance, detection and recovery for a simulated
//! multi-resource system. Orchestrates the resource ledger, the Banker's
//! safety check, the wait-for graph and the background deadlock monitor.
//!
//! ## Coverage
//!
//! | Phase | Component | Mechanism |
//! |-------|-----------|-----------|
//! | Avoidance | Safety check | Banker's algorithm on a hypothetical grant |
//! | Detection | Wait-for graph | DFS cycle search over queued requests |
//! | Notification | Deadlock monitor | Edge-triggered alerts from a polling task |
//! | Recovery | Recovery operations | Preemption, termination, rollback |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        ARBITER CORE                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │                    ┌─────────────────┐                          │
//! │                    │     Arbiter     │  ← Unified Facade        │
//! │                    └────────┬────────┘                          │
//! │                             │                                   │
//! │         ┌───────────────────┼───────────────────┐               │
//! │         ▼                   ▼                   ▼               │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐          │
//! │  │  Resource   │    │  Wait-For   │    │  Deadlock   │          │
//! │  │   Ledger    │    │    Graph    │    │   Monitor   │          │
//! │  └─────────────┘    └─────────────┘    └─────────────┘          │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use arbiter_core::{Arbiter, ArbiterConfig, RequestMode};
//!
//! let mut config = ArbiterConfig::default();
//! config.ledger.capacities = vec![1, 1];
//! config.requests.mode = RequestMode::Immediate;
//! let arbiter = Arbiter::new(config)?;
//!
//! arbiter.create_process("P0", &[1, 1], 0)?;
//! arbiter.create_process("P1", &[1, 1], 0)?;
//! arbiter.request("P0", &[1, 0])?;
//! arbiter.request("P1", &[0, 1])?;
//! arbiter.request("P0", &[0, 1])?;
//! arbiter.request("P1", &[1, 0])?;
//!
//! let report = arbiter.wait_for_graph()?;
//! assert!(report.is_deadlocked());
//!
//! arbiter.terminate("P1")?;
//! assert!(!arbiter.wait_for_graph()?.is_deadlocked());
//! # Ok::<(), arbiter_core::ArbiterError>(())
//! ```
//!
//! ## Notes
//!
//! - The library performs no I/O. Diagnostics are `tracing` events and
//!   only reach a subscriber the embedding binary installs
//! - Recovery is never automatic; alerts are for the caller to act on

mod arbiter;
mod config;
mod error;
mod outcome;

pub use arbiter::Arbiter;
pub use config::{ArbiterConfig, LedgerConfig, MonitorConfig, RequestConfig, RequestMode};
pub use error::ArbiterError;
pub use outcome::{GraphReport, RequestOutcome};

// Re-export component types for convenience
pub use arbiter_ledger::{
    safety, LedgerError, LedgerSnapshot, ProcessMeta, SafetyReport, WaitEntry,
};
pub use arbiter_monitor::{DeadlockAlert, MonitorError, WaitCycle, WaitForGraph};

/// Core result type for arbiter operations.
pub type Result<T> = std::result::Result<T, ArbiterError>;

#[cfg(test)]
mod tests;
