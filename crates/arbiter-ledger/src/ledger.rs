//! # Resource Ledger
//!
//! The single source of truth for who holds what.
//!
//! ## Concurrency
//!
//! All state sits behind one [`parking_lot::Mutex`]. Every public operation
//! takes the lock for its whole duration and releases it before returning,
//! so operations are strictly serialized and the wait queue's FIFO order is
//! the only cross-request ordering that exists. No operation blocks waiting
//! for resources: a request that cannot be granted is queued and reported
//! as [`RequestStatus::Waiting`].
//!
//! Analyses (Banker check, wait-for graph) run on a [`LedgerSnapshot`]
//! taken under the lock and then examined without it.
//!
//! ## Invariants
//!
//! - `allocation[i] <= maximum[i]` for every live process
//! - `Σ allocation[i] <= total[i]` for every resource type
//! - at most one queued entry per pid, holding its latest unmet request
//!
//! ## Example
//!
//! ```rust
//! use arbiter_ledger::{RequestStatus, ResourceLedger};
//!
//! let ledger = ResourceLedger::new(vec![1]);
//! ledger.add_process("P0", &[1], 0)?;
//! ledger.add_process("P1", &[1], 0)?;
//!
//! assert_eq!(ledger.request_resources("P0", &[1])?, RequestStatus::Granted);
//! assert_eq!(ledger.request_resources("P1", &[1])?, RequestStatus::Waiting);
//!
//! // Releasing P0's unit hands it to P1
//! let granted = ledger.release_resources("P0", &[1])?;
//! assert_eq!(granted, vec!["P1"]);
//! # Ok::<(), arbiter_ledger::LedgerError>(())
//! ```

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

use crate::error::{LedgerError, Result};
use crate::process::{fits, Process, WaitEntry};
use crate::safety::{self, SafetyReport};
use crate::snapshot::LedgerSnapshot;

/// Result of a request that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Units were added to the process's allocation.
    Granted,
    /// The request was put on the wait queue.
    Waiting,
}

/// Result of a safety-checked request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeRequest {
    /// Granted when the hypothetical state was safe, waiting otherwise.
    pub status: RequestStatus,
    /// Banker report for the hypothetical state, kept for diagnostics
    /// even when the request was queued.
    pub report: SafetyReport,
}

/// Optimistic Banker checks tried before deciding under the lock.
const OPTIMISTIC_ATTEMPTS: usize = 4;

/// Multi-resource ledger guarded by a single exclusive lock.
///
/// Construct one per scenario and share it by reference (or `Arc`). There
/// is no global instance.
#[derive(Debug)]
pub struct ResourceLedger {
    /// Capacity per resource type, fixed for the ledger's lifetime.
    total: Vec<u32>,
    state: Mutex<LedgerState>,
}

#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    pub(crate) processes: BTreeMap<String, Process>,
    pub(crate) waiting: Vec<WaitEntry>,
    pub(crate) generation: u64,
}

impl ResourceLedger {
    /// Creates an empty ledger with the given capacity per resource type.
    pub fn new(total: impl Into<Vec<u32>>) -> Self {
        Self {
            total: total.into(),
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Capacity per resource type.
    pub fn total(&self) -> &[u32] {
        &self.total
    }

    /// Number of resource types.
    pub fn resource_count(&self) -> usize {
        self.total.len()
    }

    /// Returns true if `pid` is a live process.
    pub fn contains(&self, pid: &str) -> bool {
        self.state.lock().processes.contains_key(pid)
    }

    /// Units not held by anyone, per resource type.
    pub fn available(&self) -> Vec<u32> {
        self.state.lock().available(&self.total)
    }

    /// Registers a process with zero allocation.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::AlreadyExists`] if `pid` is known
    /// - [`LedgerError::DimensionMismatch`] if `maximum` has the wrong length
    /// - [`LedgerError::ExceedsCapacity`] if any `maximum[i] > total[i]`
    pub fn add_process(&self, pid: impl Into<String>, maximum: &[u32], priority: i32) -> Result<()> {
        let pid = pid.into();
        let mut state = self.state.lock();

        if state.processes.contains_key(&pid) {
            return Err(LedgerError::AlreadyExists { pid });
        }
        self.check_dimension(maximum)?;
        if let Some((resource, (&requested, &capacity))) = maximum
            .iter()
            .zip(&self.total)
            .enumerate()
            .find(|(_, (max, cap))| max > cap)
        {
            return Err(LedgerError::ExceedsCapacity {
                pid,
                resource,
                requested,
                capacity,
            });
        }

        debug!(%pid, ?maximum, priority, "process added");
        state
            .processes
            .insert(pid, Process::new(maximum.to_vec(), priority));
        state.generation += 1;
        Ok(())
    }

    /// Requests units, granting at once if they are physically available.
    ///
    /// No safety check is made. A request that does not fit the current
    /// availability is queued and retried on every later release. A grant
    /// supersedes any request the process still had queued.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::UnknownProcess`]
    /// - [`LedgerError::DimensionMismatch`]
    /// - [`LedgerError::ExceedsDeclaredNeed`] if `request[i] > need[i]`
    pub fn request_resources(&self, pid: &str, request: &[u32]) -> Result<RequestStatus> {
        let mut state = self.state.lock();
        state.validate_request(&self.total, pid, request)?;

        let status = if fits(request, &state.available(&self.total)) {
            state.grant_direct(pid, request);
            RequestStatus::Granted
        } else {
            state.enqueue(pid, request);
            RequestStatus::Waiting
        };
        debug!(pid, ?request, ?status, "immediate request");
        Ok(status)
    }

    /// Requests units, granting only if the resulting state is safe.
    ///
    /// The Banker check runs on a snapshot without holding the lock. The
    /// decision is committed only if the ledger has not changed since that
    /// snapshot; otherwise the check is repeated on a fresh one. After a few
    /// lost races the check runs under the lock instead, so a busy ledger
    /// cannot starve the caller. Unsafe requests are queued, not denied,
    /// since they may become grantable.
    ///
    /// # Errors
    ///
    /// Same as [`request_resources`](Self::request_resources).
    pub fn request_safely(&self, pid: &str, request: &[u32]) -> Result<SafeRequest> {
        self.request_safely_within(pid, request, OPTIMISTIC_ATTEMPTS)
    }

    pub(crate) fn request_safely_within(
        &self,
        pid: &str,
        request: &[u32],
        attempts: usize,
    ) -> Result<SafeRequest> {
        for _ in 0..attempts {
            let snapshot = {
                let state = self.state.lock();
                state.validate_request(&self.total, pid, request)?;
                state.snapshot(&self.total)
            };
            let report = grant_check(&snapshot, pid, request);

            let mut state = self.state.lock();
            if state.generation != snapshot.generation {
                trace!(pid, "ledger changed during safety check, retrying");
                continue;
            }
            return Ok(state.decide(pid, request, report));
        }

        debug!(pid, attempts, "safety check contended, deciding under the lock");
        let mut state = self.state.lock();
        state.validate_request(&self.total, pid, request)?;
        let report = grant_check(&state.snapshot(&self.total), pid, request);
        Ok(state.decide(pid, request, report))
    }

    /// Returns units, then retries the wait queue.
    ///
    /// Returns the pids whose queued requests were granted by the retry,
    /// in grant order.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::UnknownProcess`]
    /// - [`LedgerError::DimensionMismatch`]
    /// - [`LedgerError::ExceedsAllocation`] if `release[i] > allocation[i]`
    pub fn release_resources(&self, pid: &str, release: &[u32]) -> Result<Vec<String>> {
        let mut state = self.state.lock();
        let process = state
            .processes
            .get_mut(pid)
            .ok_or_else(|| LedgerError::unknown(pid))?;
        if release.len() != self.total.len() {
            return Err(LedgerError::DimensionMismatch {
                expected: self.total.len(),
                actual: release.len(),
            });
        }
        if let Some((resource, (&requested, &allocated))) = release
            .iter()
            .zip(&process.allocation)
            .enumerate()
            .find(|(_, (give, held))| give > held)
        {
            return Err(LedgerError::ExceedsAllocation {
                pid: pid.to_string(),
                resource,
                requested,
                allocated,
            });
        }

        for (held, units) in process.allocation.iter_mut().zip(release) {
            *held -= units;
        }
        state.generation += 1;
        debug!(pid, ?release, "resources released");

        Ok(state.retry_waiting(&self.total))
    }

    /// Runs the wait-queue retry scan without releasing anything.
    ///
    /// Useful after a preemption has freed units. Returns the granted pids.
    pub fn retry_waiting(&self) -> Vec<String> {
        self.state.lock().retry_waiting(&self.total)
    }

    /// Returns an owned copy of the whole ledger.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.lock().snapshot(&self.total)
    }

    /// Deletes a process and all its queued requests.
    ///
    /// Unconditional. Returns false if the pid was not known.
    pub fn remove_process(&self, pid: &str) -> bool {
        self.state.lock().remove(pid)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock()
    }

    pub(crate) fn check_dimension(&self, vector: &[u32]) -> Result<()> {
        if vector.len() != self.total.len() {
            return Err(LedgerError::DimensionMismatch {
                expected: self.total.len(),
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl LedgerState {
    pub(crate) fn available(&self, total: &[u32]) -> Vec<u32> {
        let mut available = total.to_vec();
        for process in self.processes.values() {
            for (slot, held) in available.iter_mut().zip(&process.allocation) {
                *slot = slot.saturating_sub(*held);
            }
        }
        available
    }

    fn validate_request(&self, total: &[u32], pid: &str, request: &[u32]) -> Result<()> {
        let process = self
            .processes
            .get(pid)
            .ok_or_else(|| LedgerError::unknown(pid))?;
        if request.len() != total.len() {
            return Err(LedgerError::DimensionMismatch {
                expected: total.len(),
                actual: request.len(),
            });
        }
        let need = process.need();
        if let Some((resource, (&requested, &need))) = request
            .iter()
            .zip(&need)
            .enumerate()
            .find(|(_, (want, need))| want > need)
        {
            return Err(LedgerError::ExceedsDeclaredNeed {
                pid: pid.to_string(),
                resource,
                requested,
                need,
            });
        }
        Ok(())
    }

    fn grant(&mut self, pid: &str, request: &[u32]) {
        if let Some(process) = self.processes.get_mut(pid) {
            process.grant(request);
            self.generation += 1;
        }
    }

    /// Grants a fresh request. The pid's latest request is now met, so an
    /// older queued one no longer stands.
    fn grant_direct(&mut self, pid: &str, request: &[u32]) {
        self.grant(pid, request);
        let queued = self.waiting.len();
        self.waiting.retain(|entry| entry.pid != pid);
        if queued != self.waiting.len() {
            trace!(pid, "queued request superseded by grant");
        }
    }

    /// Commits a safety-checked request: grant if safe, queue otherwise.
    fn decide(&mut self, pid: &str, request: &[u32], report: SafetyReport) -> SafeRequest {
        let status = if report.safe {
            self.grant_direct(pid, request);
            RequestStatus::Granted
        } else {
            self.enqueue(pid, request);
            RequestStatus::Waiting
        };
        debug!(pid, ?request, ?status, order = ?report.order, "safety-checked request");
        SafeRequest { status, report }
    }

    /// Drops the pid's queued request if it no longer fits its remaining
    /// need. Returns true if an entry was dropped.
    pub(crate) fn drop_unreachable(&mut self, pid: &str) -> bool {
        let Some(need) = self.processes.get(pid).map(Process::need) else {
            return false;
        };
        let queued = self.waiting.len();
        self.waiting
            .retain(|entry| entry.pid != pid || fits(&entry.request, &need));
        let dropped = queued != self.waiting.len();
        if dropped {
            self.generation += 1;
            debug!(pid, "queued request exceeds remaining need, dropped");
        }
        dropped
    }

    /// Queues a request, replacing the pid's earlier entry in place.
    fn enqueue(&mut self, pid: &str, request: &[u32]) {
        match self.waiting.iter_mut().find(|entry| entry.pid == pid) {
            Some(entry) => entry.request = request.to_vec(),
            None => self.waiting.push(WaitEntry::new(pid, request.to_vec())),
        }
        self.generation += 1;
    }

    /// FIFO scan; availability is recomputed after every grant. Entries
    /// that no longer fit their process's need can never be granted and are
    /// discarded.
    pub(crate) fn retry_waiting(&mut self, total: &[u32]) -> Vec<String> {
        let mut granted = Vec::new();
        let mut index = 0;
        while index < self.waiting.len() {
            let entry = &self.waiting[index];
            let within_need = self
                .processes
                .get(&entry.pid)
                .is_some_and(|process| fits(&entry.request, &process.need()));

            if !within_need {
                let entry = self.waiting.remove(index);
                self.generation += 1;
                debug!(pid = %entry.pid, request = ?entry.request, "unreachable queued request dropped");
            } else if fits(&entry.request, &self.available(total)) {
                let entry = self.waiting.remove(index);
                self.grant(&entry.pid, &entry.request);
                trace!(pid = %entry.pid, request = ?entry.request, "queued request granted");
                granted.push(entry.pid);
            } else {
                index += 1;
            }
        }
        granted
    }

    pub(crate) fn remove(&mut self, pid: &str) -> bool {
        let existed = self.processes.remove(pid).is_some();
        let queued = self.waiting.len();
        self.waiting.retain(|entry| entry.pid != pid);
        if existed || queued != self.waiting.len() {
            self.generation += 1;
        }
        existed
    }

    fn snapshot(&self, total: &[u32]) -> LedgerSnapshot {
        LedgerSnapshot {
            total: total.to_vec(),
            available: self.available(total),
            allocations: self
                .processes
                .iter()
                .map(|(pid, p)| (pid.clone(), p.allocation.clone()))
                .collect(),
            maximum: self
                .processes
                .iter()
                .map(|(pid, p)| (pid.clone(), p.maximum.clone()))
                .collect(),
            need: self
                .processes
                .iter()
                .map(|(pid, p)| (pid.clone(), p.need()))
                .collect(),
            waiting: self.waiting.clone(),
            processes: self
                .processes
                .iter()
                .map(|(pid, p)| (pid.clone(), p.meta.clone()))
                .collect(),
            generation: self.generation,
        }
    }
}

fn grant_check(snapshot: &LedgerSnapshot, pid: &str, request: &[u32]) -> SafetyReport {
    safety::request_grant_check(
        &snapshot.total,
        &snapshot.allocations,
        &snapshot.maximum,
        pid,
        request,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(total: &[u32], processes: &[(&str, &[u32])]) -> ResourceLedger {
        let ledger = ResourceLedger::new(total.to_vec());
        for (pid, maximum) in processes {
            ledger.add_process(*pid, maximum, 0).unwrap();
        }
        ledger
    }

    #[test]
    fn test_add_process_starts_empty() {
        let ledger = ledger_with(&[10, 5, 7], &[("P0", &[7, 5, 3])]);
        let snapshot = ledger.snapshot();

        assert_eq!(snapshot.allocations["P0"], vec![0, 0, 0]);
        assert_eq!(snapshot.need["P0"], vec![7, 5, 3]);
        assert_eq!(snapshot.available, vec![10, 5, 7]);
    }

    #[test]
    fn test_add_duplicate_fails() {
        let ledger = ledger_with(&[2], &[("P0", &[1])]);
        let err = ledger.add_process("P0", &[1], 0).unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyExists { .. }));
    }

    #[test]
    fn test_add_wrong_dimension_fails() {
        let ledger = ResourceLedger::new(vec![2, 2]);
        let err = ledger.add_process("P0", &[1], 0).unwrap_err();
        assert_eq!(
            err,
            LedgerError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
        assert!(!ledger.contains("P0"));
    }

    #[test]
    fn test_add_over_capacity_leaves_ledger_unchanged() {
        let ledger = ledger_with(&[2, 2], &[("P0", &[1, 1])]);
        let before = ledger.snapshot();

        let err = ledger.add_process("P1", &[1, 3], 0).unwrap_err();

        assert_eq!(
            err,
            LedgerError::ExceedsCapacity {
                pid: "P1".into(),
                resource: 1,
                requested: 3,
                capacity: 2
            }
        );
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_request_unknown_process() {
        let ledger = ResourceLedger::new(vec![1]);
        let err = ledger.request_resources("ghost", &[1]).unwrap_err();
        assert!(matches!(err, LedgerError::UnknownProcess { .. }));
    }

    #[test]
    fn test_request_beyond_need_fails() {
        let ledger = ledger_with(&[5], &[("P0", &[2])]);
        ledger.request_resources("P0", &[1]).unwrap();

        let err = ledger.request_resources("P0", &[2]).unwrap_err();
        assert_eq!(
            err,
            LedgerError::ExceedsDeclaredNeed {
                pid: "P0".into(),
                resource: 0,
                requested: 2,
                need: 1
            }
        );
        assert_eq!(ledger.snapshot().allocations["P0"], vec![1]);
    }

    #[test]
    fn test_request_queues_when_unavailable() {
        let ledger = ledger_with(&[1], &[("P0", &[1]), ("P1", &[1])]);
        ledger.request_resources("P0", &[1]).unwrap();

        let status = ledger.request_resources("P1", &[1]).unwrap();
        assert_eq!(status, RequestStatus::Waiting);

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.waiting, vec![WaitEntry::new("P1", vec![1])]);
        assert_eq!(snapshot.allocations["P1"], vec![0]);
    }

    #[test]
    fn test_requeue_replaces_existing_entry() {
        let ledger = ledger_with(&[2, 2], &[("P0", &[2, 2]), ("P1", &[2, 2]), ("P2", &[2, 2])]);
        ledger.request_resources("P0", &[2, 2]).unwrap();
        ledger.request_resources("P1", &[1, 0]).unwrap();
        ledger.request_resources("P2", &[1, 1]).unwrap();
        ledger.request_resources("P1", &[0, 2]).unwrap();

        let waiting = ledger.snapshot().waiting;
        assert_eq!(
            waiting,
            vec![WaitEntry::new("P1", vec![0, 2]), WaitEntry::new("P2", vec![1, 1])]
        );
    }

    #[test]
    fn test_release_too_much_fails_atomically() {
        let ledger = ledger_with(&[3, 3], &[("P0", &[3, 3])]);
        ledger.request_resources("P0", &[2, 1]).unwrap();
        let before = ledger.snapshot();

        let err = ledger.release_resources("P0", &[1, 2]).unwrap_err();
        assert!(matches!(err, LedgerError::ExceedsAllocation { resource: 1, .. }));
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_release_retries_fifo_with_fresh_availability() {
        let ledger = ledger_with(&[2], &[("H", &[2]), ("A", &[2]), ("B", &[1]), ("C", &[1])]);
        ledger.request_resources("H", &[2]).unwrap();
        ledger.request_resources("A", &[2]).unwrap();
        ledger.request_resources("B", &[1]).unwrap();
        ledger.request_resources("C", &[1]).unwrap();

        // One unit back: A (first) cannot fit, B takes it, C no longer fits
        let granted = ledger.release_resources("H", &[1]).unwrap();
        assert_eq!(granted, vec!["B"]);

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.available, vec![0]);
        let still_waiting: Vec<_> = snapshot.waiting.iter().map(|e| e.pid.as_str()).collect();
        assert_eq!(still_waiting, vec!["A", "C"]);
    }

    #[test]
    fn test_direct_grant_supersedes_queued_request() {
        let ledger = ledger_with(&[2], &[("Q", &[2]), ("P", &[2])]);
        ledger.request_resources("Q", &[1]).unwrap();
        assert_eq!(ledger.request_resources("P", &[2]).unwrap(), RequestStatus::Waiting);

        // P settles for one unit; its larger request no longer stands
        assert_eq!(ledger.request_resources("P", &[1]).unwrap(), RequestStatus::Granted);
        assert!(!ledger.snapshot().is_waiting("P"));

        assert_eq!(ledger.request_resources("Q", &[1]).unwrap(), RequestStatus::Waiting);
        let waiting: Vec<_> = ledger.snapshot().waiting.into_iter().map(|e| e.pid).collect();
        assert_eq!(waiting, vec!["Q"]);

        // Nothing is left behind once Q is gone
        assert!(ledger.remove_process("Q"));
        assert!(ledger.snapshot().waiting.is_empty());
        assert_eq!(ledger.available(), vec![1]);
    }

    #[test]
    fn test_safe_grant_supersedes_queued_request() {
        let ledger = ledger_with(&[3], &[("H", &[2]), ("P", &[2])]);
        ledger.request_safely("H", &[2]).unwrap();
        assert_eq!(ledger.request_safely("P", &[2]).unwrap().status, RequestStatus::Waiting);

        let outcome = ledger.request_safely("P", &[1]).unwrap();

        assert_eq!(outcome.status, RequestStatus::Granted);
        assert!(ledger.snapshot().waiting.is_empty());
    }

    #[test]
    fn test_retry_drops_requests_beyond_need() {
        let ledger = ledger_with(&[3], &[("H", &[2]), ("P", &[2])]);
        ledger.request_resources("H", &[2]).unwrap();
        ledger.request_resources("P", &[2]).unwrap();
        // Allocation grows behind the queue's back, as a rollback can do
        ledger.lock().grant("P", &[1]);

        let granted = ledger.release_resources("H", &[2]).unwrap();

        assert!(granted.is_empty());
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.allocations["P"], vec![1]);
        assert!(snapshot.waiting.is_empty());
    }

    #[test]
    fn test_contended_safety_check_decides_under_lock() {
        let ledger = ledger_with(&[3], &[("A", &[3]), ("B", &[3])]);

        let granted = ledger.request_safely_within("A", &[1], 0).unwrap();
        assert_eq!(granted.status, RequestStatus::Granted);
        assert!(granted.report.safe);

        let queued = ledger.request_safely_within("B", &[1], 0).unwrap();
        assert_eq!(queued.status, RequestStatus::Waiting);
        assert!(ledger.snapshot().is_waiting("B"));

        let err = ledger.request_safely_within("B", &[4], 0).unwrap_err();
        assert!(matches!(err, LedgerError::ExceedsDeclaredNeed { .. }));
    }

    #[test]
    fn test_remove_process_clears_queue() {
        let ledger = ledger_with(&[1], &[("P0", &[1]), ("P1", &[1])]);
        ledger.request_resources("P0", &[1]).unwrap();
        ledger.request_resources("P1", &[1]).unwrap();

        assert!(ledger.remove_process("P1"));
        let snapshot = ledger.snapshot();
        assert!(snapshot.waiting.is_empty());
        assert!(!snapshot.allocations.contains_key("P1"));
        assert!(!ledger.remove_process("P1"));
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let ledger = ledger_with(&[4, 4], &[("P0", &[2, 2])]);
        ledger.request_resources("P0", &[1, 2]).unwrap();
        assert_eq!(ledger.snapshot(), ledger.snapshot());
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let ledger = ledger_with(&[4], &[("P0", &[2])]);
        let mut snapshot = ledger.snapshot();
        snapshot.allocations.insert("P0".into(), vec![2]);

        assert_eq!(ledger.snapshot().allocations["P0"], vec![0]);
    }

    #[test]
    fn test_safe_request_granted_with_order() {
        let ledger = ledger_with(&[3], &[("A", &[2]), ("B", &[2])]);
        let outcome = ledger.request_safely("A", &[1]).unwrap();

        assert_eq!(outcome.status, RequestStatus::Granted);
        assert!(outcome.report.safe);
        assert_eq!(outcome.report.order.len(), 2);
    }

    #[test]
    fn test_unsafe_request_is_queued() {
        let ledger = ledger_with(&[3], &[("A", &[3]), ("B", &[3])]);
        ledger.request_safely("A", &[1]).unwrap();
        let before = ledger.snapshot().allocations;

        // Granting B one unit would leave one unit for needs of two each
        let outcome = ledger.request_safely("B", &[1]).unwrap();

        assert_eq!(outcome.status, RequestStatus::Waiting);
        assert!(!outcome.report.safe);
        let after = ledger.snapshot();
        assert_eq!(after.allocations, before);
        assert!(after.is_waiting("B"));
    }

    #[test]
    fn test_generation_moves_on_mutation_only() {
        let ledger = ledger_with(&[2], &[("P0", &[2])]);
        let g0 = ledger.snapshot().generation;
        let _ = ledger.request_resources("P0", &[5]);
        assert_eq!(ledger.snapshot().generation, g0);
        ledger.request_resources("P0", &[1]).unwrap();
        assert!(ledger.snapshot().generation > g0);
    }
}
