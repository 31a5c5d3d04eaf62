//! Result types returned to the API layer.

use arbiter_monitor::{WaitCycle, WaitForGraph};
use serde::{Deserialize, Serialize};

/// What happened to a resource request.
///
/// Safety-checked requests carry the Banker finish order of the
/// hypothetical state, even when it was unsafe and the request queued.
/// Immediate-mode requests carry no order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestOutcome {
    /// Units were allocated.
    Granted {
        /// Hypothetical finish order, safety-checked mode only.
        safe_order: Option<Vec<String>>,
    },

    /// The request joined the wait queue.
    Queued {
        /// Hypothetical finish order, safety-checked mode only.
        safe_order: Option<Vec<String>>,
    },
}

impl RequestOutcome {
    /// Create a Granted outcome.
    pub fn granted(safe_order: Option<Vec<String>>) -> Self {
        Self::Granted { safe_order }
    }

    /// Create a Queued outcome.
    pub fn queued(safe_order: Option<Vec<String>>) -> Self {
        Self::Queued { safe_order }
    }

    /// Returns true if the request was granted.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }

    /// Returns true if the request was queued.
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }

    /// The hypothetical finish order, if one was computed.
    pub fn safe_order(&self) -> Option<&[String]> {
        match self {
            Self::Granted { safe_order } | Self::Queued { safe_order } => safe_order.as_deref(),
        }
    }
}

/// The current wait-for graph together with its cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphReport {
    /// Waiter to holders.
    pub graph: WaitForGraph,
    /// Circular waits, deduplicated by member set.
    pub cycles: Vec<WaitCycle>,
}

impl GraphReport {
    /// Returns true if any circular wait exists.
    pub fn is_deadlocked(&self) -> bool {
        !self.cycles.is_empty()
    }
}
