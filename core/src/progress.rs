//! Progress reporting seam between the engine and its callers
//!
//! Long runs can spend minutes inside a single convergence loop, so the
//! runner and detector emit coarse-grained progress events through this
//! trait. It is a UI/logging collaborator only — nothing in the
//! algorithmic contract depends on it, and the no-op implementation is
//! always a valid choice.

use log::{debug, info};

use crate::convergence::ThresholdEstimate;
use crate::ratio::Direction;

/// Observer of per-evaluation and per-batch progress.
///
/// Implementations must be `Sync`: evaluations run in parallel and share
/// one observer. Default bodies make every event optional.
pub trait ProgressObserver: Sync {
    /// A (category pair, direction) evaluation is starting.
    fn evaluation_started(
        &self,
        _index: usize,
        _total: usize,
        _independent: &str,
        _dependent: &str,
        _direction: Direction,
    ) {
    }

    /// A randomization batch of the given size is about to be drawn.
    fn batch_started(&self, _index: usize, _total: usize, _batch_size: u64) {}

    /// An evaluation finished with the given threshold estimate.
    fn evaluation_finished(&self, _index: usize, _total: usize, _estimate: &ThresholdEstimate) {}
}

/// Silent observer for library use and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {}

/// Observer that forwards progress to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn evaluation_started(
        &self,
        index: usize,
        total: usize,
        independent: &str,
        dependent: &str,
        direction: Direction,
    ) {
        info!(
            "({}/{}) evaluating {} -> {}{}",
            index + 1,
            total,
            independent,
            dependent,
            match direction {
                Direction::Natural => "",
                Direction::Reversed => " (reversed)",
            }
        );
    }

    fn batch_started(&self, index: usize, total: usize, batch_size: u64) {
        debug!("({}/{}) drawing batch of {} trials", index + 1, total, batch_size);
    }

    fn evaluation_finished(&self, index: usize, total: usize, estimate: &ThresholdEstimate) {
        debug!(
            "({}/{}) threshold {:.6} after {} trials in {} batches{}",
            index + 1,
            total,
            estimate.value,
            estimate.trials,
            estimate.batches,
            if estimate.converged { "" } else { " (not converged)" }
        );
    }
}
