//! # Deadlock Monitor
//!
//! Background task that polls a ledger for circular waits.
//!
//! On every tick the monitor snapshots the ledger, derives the wait-for
//! graph and looks for cycles. A new deadlock produces exactly one
//! [`DeadlockAlert`] on a bounded channel; while it persists nothing more
//! is sent, and when it clears the monitor re-arms without sending
//! anything.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐ snapshot ┌──────────────┐ cycles ┌─────────────┐
//! │ ResourceLedger │ ───────▶ │ WaitForGraph │ ─────▶ │ EdgeTrigger │
//! └────────────────┘          └──────────────┘        └──────┬──────┘
//!                                                            │ rising
//!                                                            ▼
//!                                               mpsc::Sender<DeadlockAlert>
//! ```
//!
//! The ledger lock is held only while the snapshot is copied. Graph
//! construction and cycle search run on the copy.
//!
//! ## Example
//!
//! ```rust
//! use arbiter_ledger::ResourceLedger;
//! use arbiter_monitor::{alert_channel, DeadlockMonitor, DeadlockMonitorConfig, EdgeTransition};
//! use std::sync::Arc;
//!
//! let ledger = Arc::new(ResourceLedger::new(vec![1, 1]));
//! ledger.add_process("P0", &[1, 1], 0)?;
//! ledger.add_process("P1", &[1, 1], 0)?;
//! ledger.request_resources("P0", &[1, 0])?;
//! ledger.request_resources("P1", &[0, 1])?;
//! ledger.request_resources("P0", &[0, 1])?;
//! ledger.request_resources("P1", &[1, 0])?;
//!
//! let config = DeadlockMonitorConfig::new();
//! let (tx, mut rx) = alert_channel(config.channel_capacity);
//! let mut monitor = DeadlockMonitor::new(ledger, config, tx);
//!
//! assert_eq!(monitor.tick().unwrap(), EdgeTransition::Rising);
//! assert_eq!(monitor.tick().unwrap(), EdgeTransition::Steady);
//!
//! let alert = rx.try_recv().unwrap();
//! assert_eq!(alert.cycles.len(), 1);
//! # Ok::<(), arbiter_ledger::LedgerError>(())
//! ```

use arbiter_ledger::{LedgerSnapshot, ResourceLedger};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::edge::{EdgeTransition, EdgeTrigger};
use crate::error::{MonitorError, Result};
use crate::wfg::{WaitCycle, WaitForGraph};

/// Where the monitor reads ledger state from.
///
/// Implemented by [`ResourceLedger`]. Each call must return a consistent
/// copy; the monitor never holds on to a borrow between polls.
pub trait SnapshotSource: Send + Sync + std::fmt::Debug {
    /// Returns the current state.
    fn snapshot(&self) -> LedgerSnapshot;
}

impl SnapshotSource for ResourceLedger {
    fn snapshot(&self) -> LedgerSnapshot {
        ResourceLedger::snapshot(self)
    }
}

/// Configuration for [`DeadlockMonitor`].
///
/// # Example
///
/// ```rust
/// use arbiter_monitor::DeadlockMonitorConfig;
/// use std::time::Duration;
///
/// let config = DeadlockMonitorConfig::new()
///     .with_poll_interval(Duration::from_millis(250))
///     .with_channel_capacity(4);
/// assert_eq!(config.channel_capacity, 4);
/// ```
#[derive(Debug, Clone)]
pub struct DeadlockMonitorConfig {
    /// Time between polls.
    pub poll_interval: Duration,
    /// Capacity of the alert channel.
    pub channel_capacity: usize,
}

impl DeadlockMonitorConfig {
    /// Creates a config with default values.
    ///
    /// Defaults:
    /// - Poll interval: 1.5 s
    /// - Channel capacity: 16 alerts
    #[must_use]
    pub const fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(1500),
            channel_capacity: 16,
        }
    }

    /// Sets the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the alert channel capacity.
    #[must_use]
    pub const fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

impl Default for DeadlockMonitorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Sent once when a deadlock first appears.
#[derive(Debug, Clone)]
pub struct DeadlockAlert {
    /// Detected cycles, deduplicated by member set.
    pub cycles: Vec<WaitCycle>,
    /// The graph the cycles were found in.
    pub graph: WaitForGraph,
    /// The ledger state the graph was derived from.
    pub snapshot: LedgerSnapshot,
}

/// Creates a bounded alert channel.
///
/// # Panics
///
/// Panics if `capacity` is zero, like [`tokio::sync::mpsc::channel`].
pub fn alert_channel(
    capacity: usize,
) -> (mpsc::Sender<DeadlockAlert>, mpsc::Receiver<DeadlockAlert>) {
    mpsc::channel(capacity)
}

/// Polls a ledger for circular waits and reports each new deadlock once.
///
/// Use [`tick`](Self::tick) to poll by hand, or [`spawn`](Self::spawn) to
/// run the polling loop as a tokio task.
#[derive(Debug)]
pub struct DeadlockMonitor {
    source: Arc<dyn SnapshotSource>,
    config: DeadlockMonitorConfig,
    trigger: EdgeTrigger,
    alerts: mpsc::Sender<DeadlockAlert>,
}

impl DeadlockMonitor {
    /// Creates a disarmed monitor for `ledger`, publishing on `alerts`.
    pub fn new(
        ledger: Arc<ResourceLedger>,
        config: DeadlockMonitorConfig,
        alerts: mpsc::Sender<DeadlockAlert>,
    ) -> Self {
        Self::with_source(ledger, config, alerts)
    }

    /// Creates a disarmed monitor reading from any [`SnapshotSource`].
    pub fn with_source(
        source: Arc<dyn SnapshotSource>,
        config: DeadlockMonitorConfig,
        alerts: mpsc::Sender<DeadlockAlert>,
    ) -> Self {
        Self {
            source,
            config,
            trigger: EdgeTrigger::new(),
            alerts,
        }
    }

    /// Returns true while a reported deadlock has not yet cleared.
    pub fn is_armed(&self) -> bool {
        self.trigger.is_armed()
    }

    /// Performs one poll.
    ///
    /// On a rising edge the alert is published with `try_send`; the monitor
    /// never waits on a slow consumer. A full channel drops the alert with a
    /// warning, and the edge still counts as reported.
    ///
    /// # Errors
    ///
    /// [`MonitorError::MalformedSnapshot`] if the snapshot cannot be turned
    /// into a graph. The armed state is left as it was.
    pub fn tick(&mut self) -> Result<EdgeTransition> {
        let snapshot = self.source.snapshot();
        let graph = WaitForGraph::from_snapshot(&snapshot)?;
        let cycles = graph.find_cycles();

        let transition = self.trigger.observe(!cycles.is_empty());
        match transition {
            EdgeTransition::Rising => {
                warn!(
                    cycles = cycles.len(),
                    generation = snapshot.generation,
                    "deadlock detected"
                );
                let alert = DeadlockAlert {
                    cycles,
                    graph,
                    snapshot,
                };
                match self.alerts.try_send(alert) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!("alert channel full, deadlock alert dropped");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        debug!("alert receiver gone");
                    }
                }
            }
            EdgeTransition::Falling => debug!("deadlock cleared"),
            EdgeTransition::Steady => {}
        }
        Ok(transition)
    }

    /// Runs the polling loop on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// [`MonitorError::NoRuntime`] when called outside a runtime.
    pub fn spawn(self) -> Result<MonitorHandle> {
        let runtime = Handle::try_current().map_err(|e| MonitorError::NoRuntime(e.to_string()))?;
        Ok(self.spawn_on(&runtime))
    }

    /// Runs the polling loop on `runtime`.
    ///
    /// # Panics
    ///
    /// The task panics on its first poll if the poll interval is zero.
    pub fn spawn_on(self, runtime: &Handle) -> MonitorHandle {
        let (shutdown, signal) = watch::channel(false);
        let task = runtime.spawn(self.run(signal));
        MonitorHandle { shutdown, task }
    }

    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?self.config.poll_interval, "deadlock monitor started");

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    if let Err(err) = self.tick() {
                        warn!(error = %err, "skipping monitor tick");
                    }
                }
            }
        }

        info!("deadlock monitor stopped");
    }
}

/// Owner of a running monitor task.
///
/// Dropping the handle also stops the monitor, at its next poll.
#[derive(Debug)]
pub struct MonitorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Asks the monitor to stop before its next poll, without waiting.
    pub fn signal_stop(&self) {
        // Receiver gone means the task already ended
        let _ = self.shutdown.send(true);
    }

    /// Returns true once the task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the monitor and waits for the task to end.
    ///
    /// # Errors
    ///
    /// [`MonitorError::TaskFailed`] if the task panicked or was aborted.
    pub async fn stop(self) -> Result<()> {
        self.signal_stop();
        self.task
            .await
            .map_err(|e| MonitorError::TaskFailed(e.to_string()))
    }
}
