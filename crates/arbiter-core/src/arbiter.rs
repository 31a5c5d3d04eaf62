//! The unified Arbiter facade.
//!
//! This module provides the entry point a thin API or UI layer talks to.
//! The [`Arbiter`] owns one ledger, decides requests according to the
//! configured [`RequestMode`], exposes recovery actions and manages the
//! background deadlock monitor.

use crate::{
    config::{ArbiterConfig, RequestMode},
    error::ArbiterError,
    outcome::{GraphReport, RequestOutcome},
    Result,
};

use arbiter_ledger::{recovery, LedgerSnapshot, RequestStatus, ResourceLedger, SafetyReport};
use arbiter_monitor::{alert_channel, DeadlockAlert, DeadlockMonitor, MonitorHandle, WaitForGraph};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use tracing::{debug, info, warn};

/// The unified deadlock avoidance and recovery facade.
///
/// # Model
///
/// - **Avoidance**: in [`RequestMode::Banker`] a request is granted only if
///   the resulting state is safe, and queued otherwise
/// - **Detection**: the wait-for graph is available on demand and, once
///   [`start_monitor`](Self::start_monitor) is called, polled in the
///   background with one alert per new deadlock
/// - **Recovery**: preemption, termination and checkpoint rollback
///
/// Every ledger operation is serialized by the ledger's lock; the facade
/// adds no locking of its own.
///
/// # Example
///
/// ```rust
/// use arbiter_core::{Arbiter, ArbiterConfig};
///
/// let arbiter = Arbiter::new(ArbiterConfig::default())?;
/// arbiter.create_process("P0", &[7, 5, 3], 0)?;
///
/// let outcome = arbiter.request("P0", &[0, 1, 0])?;
/// assert!(outcome.is_granted());
/// assert_eq!(outcome.safe_order(), Some(&["P0".to_string()][..]));
/// # Ok::<(), arbiter_core::ArbiterError>(())
/// ```
#[derive(Debug)]
pub struct Arbiter {
    /// Configuration.
    config: ArbiterConfig,

    /// The live ledger. Replaced wholesale by [`reset`](Self::reset).
    ledger: Arc<ResourceLedger>,

    /// Background monitor, if started.
    monitor: Option<RunningMonitor>,
}

/// A monitor task plus what is needed to restart it on a new ledger.
#[derive(Debug)]
struct RunningMonitor {
    handle: MonitorHandle,
    alerts: mpsc::Sender<DeadlockAlert>,
    runtime: Handle,
}

impl Arbiter {
    /// Create a new Arbiter with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ArbiterError::Config`] if the configuration is invalid.
    pub fn new(config: ArbiterConfig) -> Result<Self> {
        config.validate()?;
        let ledger = Arc::new(ResourceLedger::new(config.ledger.capacities.clone()));

        info!(
            capacities = ?config.ledger.capacities,
            mode = ?config.requests.mode,
            "Arbiter initialized"
        );

        Ok(Self {
            config,
            ledger,
            monitor: None,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    /// The live ledger.
    pub fn ledger(&self) -> &Arc<ResourceLedger> {
        &self.ledger
    }

    /// Register a process with a declared maximum claim.
    pub fn create_process(&self, pid: &str, maximum: &[u32], priority: i32) -> Result<()> {
        self.ledger.add_process(pid, maximum, priority)?;
        info!("Created process {} with maximum {:?}", pid, maximum);
        Ok(())
    }

    /// Request resources using the configured mode.
    pub fn request(&self, pid: &str, request: &[u32]) -> Result<RequestOutcome> {
        self.request_with_mode(pid, request, self.config.requests.mode)
    }

    /// Request resources using an explicit mode.
    ///
    /// Neither mode blocks: a request that cannot be granted now is queued
    /// and retried whenever resources are released.
    pub fn request_with_mode(
        &self,
        pid: &str,
        request: &[u32],
        mode: RequestMode,
    ) -> Result<RequestOutcome> {
        let outcome = match mode {
            RequestMode::Banker => {
                let decision = self.ledger.request_safely(pid, request)?;
                let order = Some(decision.report.order);
                match decision.status {
                    RequestStatus::Granted => RequestOutcome::granted(order),
                    RequestStatus::Waiting => RequestOutcome::queued(order),
                }
            }
            RequestMode::Immediate => match self.ledger.request_resources(pid, request)? {
                RequestStatus::Granted => RequestOutcome::granted(None),
                RequestStatus::Waiting => RequestOutcome::queued(None),
            },
        };

        if outcome.is_granted() {
            debug!("Granted {:?} to {} ({:?} mode)", request, pid, mode);
        } else {
            debug!("Queued {:?} for {} ({:?} mode)", request, pid, mode);
        }
        Ok(outcome)
    }

    /// Release resources and retry the wait queue.
    ///
    /// Returns the pids whose queued requests were granted as a result.
    pub fn release(&self, pid: &str, release: &[u32]) -> Result<Vec<String>> {
        let granted = self.ledger.release_resources(pid, release)?;
        if !granted.is_empty() {
            debug!("Release by {} unblocked {:?}", pid, granted);
        }
        Ok(granted)
    }

    /// Retry the wait queue without releasing anything.
    pub fn retry_waiting(&self) -> Vec<String> {
        self.ledger.retry_waiting()
    }

    /// Current ledger state. The read model for status displays.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.ledger.snapshot()
    }

    /// Banker's safety check on the current state.
    pub fn safety(&self) -> SafetyReport {
        self.ledger.snapshot().safety()
    }

    /// Compute the wait-for graph and its cycles now.
    ///
    /// Independent of the background monitor and its armed state.
    pub fn wait_for_graph(&self) -> Result<GraphReport> {
        let graph = WaitForGraph::from_snapshot(&self.ledger.snapshot())?;
        let cycles = graph.find_cycles();
        Ok(GraphReport { graph, cycles })
    }

    /// Take up to `vector` units away from `pid`.
    ///
    /// Freed units are handed out on the next release or
    /// [`retry_waiting`](Self::retry_waiting).
    pub fn preempt(&self, pid: &str, vector: &[u32]) -> Result<Vec<u32>> {
        let taken = recovery::preempt(&self.ledger, pid, vector)?;
        warn!("Preempted {:?} from {}", taken, pid);
        Ok(taken)
    }

    /// Remove `pid` and everything it holds or waits for.
    pub fn terminate(&self, pid: &str) -> Result<()> {
        recovery::terminate(&self.ledger, pid)?;
        warn!("Terminated process {}", pid);
        Ok(())
    }

    /// Save the current allocation of `pid` for a later rollback.
    pub fn checkpoint(&self, pid: &str) -> Result<Vec<u32>> {
        let saved = recovery::checkpoint(&self.ledger, pid)?;
        debug!("Checkpointed {} at {:?}", pid, saved);
        Ok(saved)
    }

    /// Restore the checkpointed allocation of `pid`.
    pub fn rollback(&self, pid: &str) -> Result<()> {
        recovery::rollback(&self.ledger, pid)?;
        warn!("Rolled back process {}", pid);
        Ok(())
    }

    /// Discard the ledger and start over with the configured capacities.
    ///
    /// Destructive, with no undo. A running monitor is moved to the new
    /// ledger and keeps publishing on the same alert channel.
    pub fn reset(&mut self) {
        self.ledger = Arc::new(ResourceLedger::new(self.config.ledger.capacities.clone()));

        if let Some(running) = self.monitor.take() {
            running.handle.signal_stop();
            let monitor = DeadlockMonitor::new(
                Arc::clone(&self.ledger),
                self.config.monitor.to_monitor_config(),
                running.alerts.clone(),
            );
            let handle = monitor.spawn_on(&running.runtime);
            self.monitor = Some(RunningMonitor { handle, ..running });
        }

        info!("Ledger reset, all processes cleared");
    }

    /// Start the background deadlock monitor.
    ///
    /// Must be called from within a tokio runtime. Returns the receiving end
    /// of the alert channel; each new deadlock produces one alert.
    ///
    /// # Errors
    ///
    /// - [`ArbiterError::MonitorAlreadyRunning`]
    /// - [`ArbiterError::Monitor`] if no runtime is available
    pub fn start_monitor(&mut self) -> Result<mpsc::Receiver<DeadlockAlert>> {
        if self.monitor.is_some() {
            return Err(ArbiterError::MonitorAlreadyRunning);
        }
        let runtime = Handle::try_current()
            .map_err(|e| arbiter_monitor::MonitorError::NoRuntime(e.to_string()))?;

        let config = self.config.monitor.to_monitor_config();
        let (alerts, receiver) = alert_channel(config.channel_capacity);
        let handle =
            DeadlockMonitor::new(Arc::clone(&self.ledger), config, alerts.clone()).spawn_on(&runtime);

        self.monitor = Some(RunningMonitor {
            handle,
            alerts,
            runtime,
        });
        info!("Deadlock monitor running");
        Ok(receiver)
    }

    /// Stop the background monitor, if running, and wait for it to end.
    ///
    /// The alert channel closes once the monitor is gone.
    pub async fn stop_monitor(&mut self) -> Result<()> {
        if let Some(running) = self.monitor.take() {
            drop(running.alerts);
            running.handle.stop().await?;
        }
        Ok(())
    }

    /// Returns true while the background monitor is running.
    pub fn is_monitoring(&self) -> bool {
        self.monitor
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArbiterConfig;

    fn arbiter(capacities: &[u32], mode: RequestMode) -> Arbiter {
        let mut config = ArbiterConfig::default();
        config.ledger.capacities = capacities.to_vec();
        config.requests.mode = mode;
        Arbiter::new(config).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ArbiterConfig::default();
        config.ledger.capacities.clear();
        assert!(matches!(Arbiter::new(config), Err(ArbiterError::Config(_))));
    }

    #[test]
    fn test_immediate_mode_has_no_order() {
        let arbiter = arbiter(&[2], RequestMode::Immediate);
        arbiter.create_process("P0", &[2], 0).unwrap();

        let outcome = arbiter.request("P0", &[1]).unwrap();
        assert_eq!(outcome, RequestOutcome::granted(None));
    }

    #[test]
    fn test_banker_mode_queues_unsafe_with_order() {
        let arbiter = arbiter(&[3], RequestMode::Banker);
        arbiter.create_process("A", &[3], 0).unwrap();
        arbiter.create_process("B", &[3], 0).unwrap();
        assert!(arbiter.request("A", &[1]).unwrap().is_granted());

        let outcome = arbiter.request("B", &[1]).unwrap();
        assert!(outcome.is_queued());
        assert_eq!(outcome.safe_order(), Some(&[][..]));
    }

    #[test]
    fn test_immediate_mode_grants_unsafe_state() {
        let arbiter = arbiter(&[3], RequestMode::Banker);
        arbiter.create_process("A", &[3], 0).unwrap();
        arbiter.create_process("B", &[3], 0).unwrap();
        arbiter.request("A", &[1]).unwrap();

        let outcome = arbiter
            .request_with_mode("B", &[1], RequestMode::Immediate)
            .unwrap();
        assert!(outcome.is_granted());
        assert!(!arbiter.safety().safe);
    }

    #[test]
    fn test_errors_pass_through() {
        let arbiter = arbiter(&[1], RequestMode::Banker);
        let err = arbiter.request("ghost", &[1]).unwrap_err();
        assert!(matches!(
            err,
            ArbiterError::Ledger(arbiter_ledger::LedgerError::UnknownProcess { .. })
        ));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut arbiter = arbiter(&[2, 2], RequestMode::Immediate);
        arbiter.create_process("P0", &[2, 2], 0).unwrap();
        arbiter.request("P0", &[1, 1]).unwrap();

        arbiter.reset();

        let snapshot = arbiter.snapshot();
        assert!(snapshot.allocations.is_empty());
        assert_eq!(snapshot.total, vec![2, 2]);
        assert_eq!(snapshot.available, vec![2, 2]);
        arbiter.create_process("P0", &[1, 1], 0).unwrap();
    }

    #[test]
    fn test_debug_shows_config_and_monitor_state() {
        let arbiter = arbiter(&[4], RequestMode::Immediate);
        let rendered = format!("{arbiter:?}");
        assert!(rendered.starts_with("Arbiter"));
        assert!(rendered.contains("Immediate"));
        assert!(rendered.contains("monitor: None"));
    }

    #[test]
    fn test_start_monitor_needs_runtime() {
        let mut arbiter = arbiter(&[1], RequestMode::Banker);
        assert!(matches!(
            arbiter.start_monitor(),
            Err(ArbiterError::Monitor(_))
        ));
        assert!(!arbiter.is_monitoring());
    }
}
