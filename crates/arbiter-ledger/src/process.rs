//! Per-process bookkeeping and wait-queue entries.

use serde::{Deserialize, Serialize};

/// Metadata kept alongside a process's vectors.
///
/// `priority` is informational. No algorithm in this crate reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessMeta {
    /// Caller-assigned priority.
    pub priority: i32,
    /// Allocation saved by [`checkpoint`](crate::recovery::checkpoint).
    pub checkpoint: Option<Vec<u32>>,
}

/// A request that could not be granted when it was made.
///
/// # Example
///
/// ```rust
/// use arbiter_ledger::WaitEntry;
///
/// let entry = WaitEntry::new("P1", vec![1, 0]);
/// assert_eq!(entry.pid, "P1");
/// assert!(entry.wants(0));
/// assert!(!entry.wants(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitEntry {
    /// Waiting process
    pub pid: String,
    /// Units requested per resource type
    pub request: Vec<u32>,
}

impl WaitEntry {
    /// Creates a wait entry.
    pub fn new(pid: impl Into<String>, request: Vec<u32>) -> Self {
        Self {
            pid: pid.into(),
            request,
        }
    }

    /// Returns true if the request asks for at least one unit of `resource`.
    pub fn wants(&self, resource: usize) -> bool {
        self.request.get(resource).is_some_and(|&units| units > 0)
    }
}

/// A live process as the ledger stores it.
#[derive(Debug, Clone)]
pub(crate) struct Process {
    pub(crate) allocation: Vec<u32>,
    pub(crate) maximum: Vec<u32>,
    pub(crate) meta: ProcessMeta,
}

impl Process {
    /// Creates a process holding nothing.
    pub(crate) fn new(maximum: Vec<u32>, priority: i32) -> Self {
        Self {
            allocation: vec![0; maximum.len()],
            maximum,
            meta: ProcessMeta {
                priority,
                checkpoint: None,
            },
        }
    }

    /// `maximum - allocation`, per resource type.
    pub(crate) fn need(&self) -> Vec<u32> {
        need_of(&self.maximum, &self.allocation)
    }

    pub(crate) fn grant(&mut self, request: &[u32]) {
        for (held, units) in self.allocation.iter_mut().zip(request) {
            *held += units;
        }
    }
}

/// Returns true if every entry of `request` is at most the matching entry
/// of `limit`.
pub(crate) fn fits(request: &[u32], limit: &[u32]) -> bool {
    request.iter().zip(limit).all(|(want, have)| want <= have)
}

pub(crate) fn need_of(maximum: &[u32], allocation: &[u32]) -> Vec<u32> {
    maximum
        .iter()
        .zip(allocation)
        .map(|(max, held)| max.saturating_sub(*held))
        .collect()
}
