//! Wait-for graph construction and cycle detection.
//!
//! An edge `p -> q` means `p` has a queued request for a resource type of
//! which `q` holds at least one unit. A cycle in this graph is a circular
//! wait: every process on it waits for the next one.

use arbiter_ledger::LedgerSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{MonitorError, Result};

/// A closed wait loop, in traversal order.
///
/// Two cycles over the same processes are the same deadlock regardless of
/// where the traversal entered them or which way it went round.
///
/// # Example
///
/// ```rust
/// use arbiter_monitor::WaitCycle;
///
/// let cycle = WaitCycle::new(vec!["P0".into(), "P1".into()]);
/// assert_eq!(cycle.len(), 2);
/// assert!(cycle.contains("P1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitCycle {
    pids: Vec<String>,
}

impl WaitCycle {
    /// Creates a cycle from processes in traversal order.
    pub fn new(pids: Vec<String>) -> Self {
        Self { pids }
    }

    /// Processes in traversal order.
    pub fn pids(&self) -> &[String] {
        &self.pids
    }

    /// Processes as a set. This is the cycle's identity.
    pub fn members(&self) -> BTreeSet<&str> {
        self.pids.iter().map(String::as_str).collect()
    }

    /// Number of processes on the cycle.
    pub fn len(&self) -> usize {
        self.pids.len()
    }

    /// Always false for a detected cycle.
    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    /// Returns true if `pid` is on the cycle.
    pub fn contains(&self, pid: &str) -> bool {
        self.pids.iter().any(|p| p == pid)
    }
}

/// Directed wait-for graph over pids.
///
/// Edges are a set: several reasons for `p` to wait on `q` collapse into a
/// single edge. Self-edges are never stored.
///
/// # Example
///
/// ```rust
/// use arbiter_monitor::WaitForGraph;
///
/// let mut graph = WaitForGraph::new();
/// graph.add_edge("P0", "P1");
/// graph.add_edge("P1", "P0");
/// graph.add_edge("P2", "P2"); // ignored
///
/// let cycles = graph.find_cycles();
/// assert_eq!(cycles.len(), 1);
/// assert_eq!(cycles[0].len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitForGraph {
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl WaitForGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the graph from a ledger snapshot.
    ///
    /// For every queued `(pid, request)` and every resource type the request
    /// asks for, adds `pid -> holder` for each other process holding a unit
    /// of that type.
    ///
    /// # Errors
    ///
    /// [`MonitorError::MalformedSnapshot`] if a vector has the wrong length
    /// or a queued pid has no allocation entry.
    pub fn from_snapshot(snapshot: &LedgerSnapshot) -> Result<Self> {
        validate(snapshot)?;

        let mut graph = Self::new();
        for entry in &snapshot.waiting {
            for resource in (0..entry.request.len()).filter(|&r| entry.wants(r)) {
                for (holder, allocation) in &snapshot.allocations {
                    if allocation[resource] > 0 {
                        graph.add_edge(&entry.pid, holder);
                    }
                }
            }
        }
        Ok(graph)
    }

    /// Adds `from -> to`. Self-edges are ignored.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        self.edges
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    /// Adjacency map: waiter to the set of processes it waits on.
    pub fn edges(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.edges
    }

    /// Returns true if `from` waits on `to`.
    pub fn waits_on(&self, from: &str, to: &str) -> bool {
        self.edges.get(from).is_some_and(|targets| targets.contains(to))
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    /// Returns true if nobody waits on anybody.
    pub fn is_empty(&self) -> bool {
        self.edge_count() == 0
    }

    /// Finds wait cycles, deduplicated by member set.
    ///
    /// # Algorithm
    ///
    /// Depth-first search from every unvisited waiter with an explicit
    /// stack of the current path. An edge back into a node still on the
    /// stack closes a cycle made of the stack suffix from that node. Each
    /// cycle is then keyed by its sorted member set and reported once,
    /// in first-found order.
    ///
    /// Waiters are visited in pid order, so results are deterministic.
    pub fn find_cycles(&self) -> Vec<WaitCycle> {
        let mut search = CycleSearch::new(&self.edges);
        for node in self.edges.keys() {
            if !search.visited.contains(node.as_str()) {
                search.visit(node);
            }
        }

        let mut seen: BTreeSet<BTreeSet<&str>> = BTreeSet::new();
        search
            .found
            .into_iter()
            .filter(|cycle| seen.insert(cycle.iter().copied().collect()))
            .map(|cycle| WaitCycle::new(cycle.into_iter().map(str::to_string).collect()))
            .collect()
    }
}

/// DFS state for [`WaitForGraph::find_cycles`].
struct CycleSearch<'a> {
    edges: &'a BTreeMap<String, BTreeSet<String>>,
    visited: BTreeSet<&'a str>,
    stack: Vec<&'a str>,
    on_stack: BTreeSet<&'a str>,
    found: Vec<Vec<&'a str>>,
}

impl<'a> CycleSearch<'a> {
    fn new(edges: &'a BTreeMap<String, BTreeSet<String>>) -> Self {
        Self {
            edges,
            visited: BTreeSet::new(),
            stack: Vec::new(),
            on_stack: BTreeSet::new(),
            found: Vec::new(),
        }
    }

    fn visit(&mut self, node: &'a str) {
        self.visited.insert(node);
        self.stack.push(node);
        self.on_stack.insert(node);

        let edges = self.edges;
        for next in edges.get(node).into_iter().flatten() {
            let next = next.as_str();
            if !self.visited.contains(next) {
                self.visit(next);
            } else if self.on_stack.contains(next) {
                if let Some(start) = self.stack.iter().position(|n| *n == next) {
                    self.found.push(self.stack[start..].to_vec());
                }
            }
        }

        self.stack.pop();
        self.on_stack.remove(node);
    }
}

fn validate(snapshot: &LedgerSnapshot) -> Result<()> {
    let n = snapshot.total.len();
    for (pid, allocation) in &snapshot.allocations {
        if allocation.len() != n {
            return Err(MonitorError::MalformedSnapshot(format!(
                "allocation of {pid} has {} entries, expected {n}",
                allocation.len()
            )));
        }
    }
    for entry in &snapshot.waiting {
        if entry.request.len() != n {
            return Err(MonitorError::MalformedSnapshot(format!(
                "queued request of {} has {} entries, expected {n}",
                entry.pid,
                entry.request.len()
            )));
        }
        if !snapshot.allocations.contains_key(&entry.pid) {
            return Err(MonitorError::MalformedSnapshot(format!(
                "queued request from unknown process {}",
                entry.pid
            )));
        }
    }
    Ok(())
}
