//! # Deadlock Recovery
//!
//! Explicit, caller-invoked operations that change what a process holds
//! in order to break a circular wait. Nothing here runs automatically.
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | [`preempt`] | Takes units away from a victim, clamped to what it holds |
//! | [`terminate`] | Removes a process, its holdings and its queued requests |
//! | [`checkpoint`] | Saves a process's current allocation |
//! | [`rollback`] | Restores a saved allocation verbatim |
//!
//! Units freed by preemption are not handed out here. They go to the wait
//! queue on the next release or on [`ResourceLedger::retry_waiting`].
//!
//! ## Example
//!
//! ```rust
//! use arbiter_ledger::{recovery, ResourceLedger};
//!
//! let ledger = ResourceLedger::new(vec![2]);
//! ledger.add_process("P0", &[2], 0)?;
//! ledger.request_resources("P0", &[2])?;
//!
//! // Over-large vectors are clamped to what the victim holds
//! recovery::preempt(&ledger, "P0", &[5])?;
//! assert_eq!(ledger.available(), vec![2]);
//! # Ok::<(), arbiter_ledger::LedgerError>(())
//! ```

use tracing::debug;

use crate::error::{LedgerError, Result};
use crate::ledger::ResourceLedger;

/// Removes `min(vector[i], allocation[i])` units from the victim.
///
/// Returns the units actually taken, per resource type. Never fails on an
/// over-large vector.
///
/// # Errors
///
/// - [`LedgerError::UnknownProcess`] if the victim is absent
/// - [`LedgerError::DimensionMismatch`] if `vector` has the wrong length
pub fn preempt(ledger: &ResourceLedger, victim: &str, vector: &[u32]) -> Result<Vec<u32>> {
    let mut state = ledger.lock();
    let process = state
        .processes
        .get_mut(victim)
        .ok_or_else(|| LedgerError::unknown(victim))?;
    ledger.check_dimension(vector)?;

    let taken: Vec<u32> = process
        .allocation
        .iter_mut()
        .zip(vector)
        .map(|(held, want)| {
            let take = (*want).min(*held);
            *held -= take;
            take
        })
        .collect();
    state.generation += 1;

    debug!(victim, ?taken, "resources preempted");
    Ok(taken)
}

/// Removes a process entirely. Everything it held becomes available.
///
/// # Errors
///
/// [`LedgerError::UnknownProcess`] if `pid` is absent.
pub fn terminate(ledger: &ResourceLedger, pid: &str) -> Result<()> {
    let mut state = ledger.lock();
    if !state.remove(pid) {
        return Err(LedgerError::unknown(pid));
    }
    debug!(pid, "process terminated");
    Ok(())
}

/// Saves the current allocation of `pid` as its checkpoint, replacing any
/// earlier one. Returns the saved vector.
pub fn checkpoint(ledger: &ResourceLedger, pid: &str) -> Result<Vec<u32>> {
    let mut state = ledger.lock();
    let process = state
        .processes
        .get_mut(pid)
        .ok_or_else(|| LedgerError::unknown(pid))?;
    let saved = process.allocation.clone();
    process.meta.checkpoint = Some(saved.clone());
    state.generation += 1;
    Ok(saved)
}

/// Replaces the allocation of `pid` with its checkpoint.
///
/// This is a hard reset, not a delta: the process may end up holding more
/// or fewer units than before. The checkpoint is kept, so rollback can be
/// repeated. A queued request of the process that no longer fits its
/// remaining need is dropped.
///
/// # Errors
///
/// - [`LedgerError::UnknownProcess`] if `pid` is absent
/// - [`LedgerError::NoCheckpoint`] if no checkpoint was saved
/// - [`LedgerError::ExceedsCapacity`] if the restored allocation would not
///   fit next to what other processes hold now
pub fn rollback(ledger: &ResourceLedger, pid: &str) -> Result<()> {
    let mut state = ledger.lock();
    let available = state.available(ledger.total());
    let process = state
        .processes
        .get_mut(pid)
        .ok_or_else(|| LedgerError::unknown(pid))?;
    let saved = process
        .meta
        .checkpoint
        .clone()
        .ok_or_else(|| LedgerError::NoCheckpoint {
            pid: pid.to_string(),
        })?;

    // A process can hold what it holds now plus whatever is free
    for (resource, ((want, held), free)) in saved
        .iter()
        .zip(&process.allocation)
        .zip(&available)
        .enumerate()
    {
        let capacity = held + free;
        if *want > capacity {
            return Err(LedgerError::ExceedsCapacity {
                pid: pid.to_string(),
                resource,
                requested: *want,
                capacity,
            });
        }
    }

    debug!(pid, from = ?process.allocation, to = ?saved, "rolled back to checkpoint");
    process.allocation = saved;
    state.generation += 1;
    state.drop_unreachable(pid);
    Ok(())
}
