//! Immutable copies of ledger state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::process::{ProcessMeta, WaitEntry};
use crate::safety::{self, SafetyReport};

/// A consistent, owned copy of everything the ledger knows.
///
/// Snapshots are the read model for every analysis: the Banker check and
/// the wait-for graph both run against a snapshot so they never observe a
/// ledger mid-mutation and never hold its lock.
///
/// Maps are keyed by pid and ordered by pid, which fixes the scan order of
/// [`is_safe`](crate::safety::is_safe).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Capacity per resource type.
    pub total: Vec<u32>,
    /// `total - Σ allocation`, per resource type.
    pub available: Vec<u32>,
    /// Units held, per process.
    pub allocations: BTreeMap<String, Vec<u32>>,
    /// Declared maxima, per process.
    pub maximum: BTreeMap<String, Vec<u32>>,
    /// `maximum - allocation`, per process.
    pub need: BTreeMap<String, Vec<u32>>,
    /// Unmet requests in arrival order.
    pub waiting: Vec<WaitEntry>,
    /// Priority and checkpoint, per process.
    pub processes: BTreeMap<String, ProcessMeta>,
    /// Mutation counter of the ledger when the snapshot was taken.
    pub generation: u64,
}

impl LedgerSnapshot {
    /// Number of resource types.
    pub fn resource_count(&self) -> usize {
        self.total.len()
    }

    /// Number of live processes.
    pub fn process_count(&self) -> usize {
        self.allocations.len()
    }

    /// Returns true if `pid` has a queued request.
    pub fn is_waiting(&self, pid: &str) -> bool {
        self.waiting.iter().any(|entry| entry.pid == pid)
    }

    /// Runs the Banker's safety check on this state.
    pub fn safety(&self) -> SafetyReport {
        safety::is_safe(&self.total, &self.allocations, &self.maximum)
    }
}
