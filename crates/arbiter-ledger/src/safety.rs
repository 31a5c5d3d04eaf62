//! # Banker's Algorithm
//!
//! Decides whether a resource state is *safe*: whether some order exists
//! in which every process can be handed its full remaining need, finish,
//! and return everything it holds.
//!
//! ## Algorithm
//!
//! 1. `work = total - Σ allocation`
//! 2. Scan unfinished processes in pid order; any process whose need fits
//!    in `work` finishes and returns its allocation to `work`
//! 3. Repeat full passes until a pass finishes nobody
//! 4. The state is safe iff every process finished
//!
//! Worst case is O(n·p²) for p processes and n resource types.
//!
//! The finish order depends on the scan order. Callers comparing results
//! across implementations should compare the safety flag and the set of
//! finished processes.
//!
//! ## Example
//!
//! ```rust
//! use arbiter_ledger::safety::is_safe;
//! use std::collections::BTreeMap;
//!
//! let allocations = BTreeMap::from([
//!     ("P0".to_string(), vec![1]),
//!     ("P1".to_string(), vec![1]),
//! ]);
//! let maximum = BTreeMap::from([
//!     ("P0".to_string(), vec![2]),
//!     ("P1".to_string(), vec![3]),
//! ]);
//!
//! let report = is_safe(&[3], &allocations, &maximum);
//! assert!(report.safe);
//! assert_eq!(report.order, vec!["P0", "P1"]);
//! ```
//!
//! ## References
//!
//! - Dijkstra, E. W. (1965). "Cooperating Sequential Processes", EWD123.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::process::{fits, need_of};

/// Outcome of a safety check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyReport {
    /// Whether every process could finish.
    pub safe: bool,
    /// Processes in the order they finished. Partial when unsafe.
    pub order: Vec<String>,
    /// Work vector after the last pass.
    pub available: Vec<u32>,
}

impl SafetyReport {
    fn overcommitted(resource_count: usize) -> Self {
        Self {
            safe: false,
            order: Vec::new(),
            available: vec![0; resource_count],
        }
    }
}

/// Runs the Banker's safety check.
///
/// `allocations` defines the process set. A process with no entry in
/// `maxima` is treated as having no outstanding need.
///
/// A state whose allocations exceed `total` for some resource type cannot
/// exist physically and is reported unsafe with an empty order.
pub fn is_safe(
    total: &[u32],
    allocations: &BTreeMap<String, Vec<u32>>,
    maxima: &BTreeMap<String, Vec<u32>>,
) -> SafetyReport {
    let mut work = total.to_vec();
    for allocation in allocations.values() {
        for (slot, held) in work.iter_mut().zip(allocation) {
            match slot.checked_sub(*held) {
                Some(left) => *slot = left,
                None => return SafetyReport::overcommitted(total.len()),
            }
        }
    }

    let need: BTreeMap<&str, Vec<u32>> = allocations
        .iter()
        .map(|(pid, allocation)| {
            let need = maxima
                .get(pid)
                .map(|maximum| need_of(maximum, allocation))
                .unwrap_or_else(|| vec![0; allocation.len()]);
            (pid.as_str(), need)
        })
        .collect();

    let mut finished: BTreeMap<&str, bool> = need.keys().map(|pid| (*pid, false)).collect();
    let mut order = Vec::with_capacity(allocations.len());

    let mut changed = true;
    while changed {
        changed = false;
        for (pid, allocation) in allocations {
            let pid = pid.as_str();
            if finished[pid] || !fits(&need[pid], &work) {
                continue;
            }
            for (slot, held) in work.iter_mut().zip(allocation) {
                *slot += held;
            }
            finished.insert(pid, true);
            order.push(pid.to_string());
            changed = true;
        }
    }

    SafetyReport {
        safe: order.len() == allocations.len(),
        order,
        available: work,
    }
}

/// Checks whether granting `request` to `pid` would leave a safe state.
///
/// The grant is simulated on a copy; the inputs are not modified. A request
/// larger than what is currently available yields an unsafe report, since
/// the grant could not happen at all. If `pid` is not in `allocations` the
/// state is evaluated as it stands.
pub fn request_grant_check(
    total: &[u32],
    allocations: &BTreeMap<String, Vec<u32>>,
    maxima: &BTreeMap<String, Vec<u32>>,
    pid: &str,
    request: &[u32],
) -> SafetyReport {
    let mut hypothetical = allocations.clone();
    if let Some(allocation) = hypothetical.get_mut(pid) {
        for (held, units) in allocation.iter_mut().zip(request) {
            *held += units;
        }
    }
    is_safe(total, &hypothetical, maxima)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn vectors(entries: &[(&str, &[u32])]) -> BTreeMap<String, Vec<u32>> {
        entries
            .iter()
            .map(|(pid, v)| (pid.to_string(), v.to_vec()))
            .collect()
    }

    fn classic() -> (Vec<u32>, BTreeMap<String, Vec<u32>>, BTreeMap<String, Vec<u32>>) {
        let allocations = vectors(&[
            ("P0", &[0, 1, 0]),
            ("P1", &[2, 0, 0]),
            ("P2", &[3, 0, 2]),
            ("P3", &[2, 1, 1]),
            ("P4", &[0, 0, 2]),
        ]);
        let maximum = vectors(&[
            ("P0", &[7, 5, 3]),
            ("P1", &[3, 2, 2]),
            ("P2", &[9, 0, 2]),
            ("P3", &[2, 2, 2]),
            ("P4", &[4, 3, 3]),
        ]);
        (vec![10, 5, 7], allocations, maximum)
    }

    #[test]
    fn test_classic_state_is_safe() {
        let (total, allocations, maximum) = classic();
        let report = is_safe(&total, &allocations, &maximum);

        assert!(report.safe);
        let finished: BTreeSet<_> = report.order.iter().cloned().collect();
        assert_eq!(finished, allocations.keys().cloned().collect());
        // Everything returned once all processes finish
        assert_eq!(report.available, total);
    }

    #[test]
    fn test_classic_order_with_pid_scan() {
        let (total, allocations, maximum) = classic();
        let report = is_safe(&total, &allocations, &maximum);
        assert_eq!(report.order, vec!["P1", "P3", "P4", "P0", "P2"]);
    }

    #[test]
    fn test_unsafe_state() {
        // Both hold one unit and may each want two more; one unit left
        let allocations = vectors(&[("A", &[1]), ("B", &[1])]);
        let maximum = vectors(&[("A", &[3]), ("B", &[3])]);
        let report = is_safe(&[3], &allocations, &maximum);

        assert!(!report.safe);
        assert!(report.order.is_empty());
        assert_eq!(report.available, vec![1]);
    }

    #[test]
    fn test_partial_order_when_unsafe() {
        let allocations = vectors(&[("A", &[1]), ("B", &[1]), ("C", &[0])]);
        let maximum = vectors(&[("A", &[4]), ("B", &[4]), ("C", &[1])]);
        let report = is_safe(&[3], &allocations, &maximum);

        assert!(!report.safe);
        assert_eq!(report.order, vec!["C"]);
    }

    #[test]
    fn test_empty_state_is_safe() {
        let report = is_safe(&[4, 4], &BTreeMap::new(), &BTreeMap::new());
        assert!(report.safe);
        assert!(report.order.is_empty());
        assert_eq!(report.available, vec![4, 4]);
    }

    #[test]
    fn test_overcommitted_state_is_unsafe() {
        let allocations = vectors(&[("A", &[2]), ("B", &[2])]);
        let maximum = vectors(&[("A", &[2]), ("B", &[2])]);
        let report = is_safe(&[3], &allocations, &maximum);
        assert!(!report.safe);
        assert!(report.order.is_empty());
    }

    #[test]
    fn test_grant_check_does_not_mutate_inputs() {
        let (total, allocations, maximum) = classic();
        let before = allocations.clone();

        let report = request_grant_check(&total, &allocations, &maximum, "P1", &[1, 0, 2]);

        assert!(report.safe);
        assert_eq!(allocations, before);
    }

    #[test]
    fn test_grant_check_rejects_unsafe_grant() {
        let (total, allocations, maximum) = classic();
        // Classic textbook case: P0 asking for (0,2,0) leaves no safe order
        let after_p1 = {
            let mut a = allocations.clone();
            a.insert("P1".into(), vec![3, 0, 2]);
            a
        };
        assert!(is_safe(&total, &after_p1, &maximum).safe);

        let report = request_grant_check(&total, &after_p1, &maximum, "P0", &[0, 2, 0]);
        assert!(!report.safe);
    }

    #[test]
    fn test_grant_check_beyond_availability_is_unsafe() {
        let allocations = vectors(&[("A", &[1])]);
        let maximum = vectors(&[("A", &[2])]);
        let report = request_grant_check(&[1], &allocations, &maximum, "A", &[1]);
        assert!(!report.safe);
    }

    #[test]
    fn test_missing_maximum_means_no_need() {
        let allocations = vectors(&[("A", &[1])]);
        let report = is_safe(&[1], &allocations, &BTreeMap::new());
        assert!(report.safe);
        assert_eq!(report.order, vec!["A"]);
    }
}
