//! Handles and status for in-flight runs.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::runtime::runner::RunnerError;
use crate::state::VersionedState;
use crate::types::{ChannelType, NodeKind};

/// Lifecycle of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// What one superstep did.
#[derive(Clone, Debug)]
pub struct StepReport {
    pub step: u64,
    /// Nodes executed this superstep, in frontier order.
    pub ran: Vec<NodeKind>,
    /// Channels the barrier changed.
    pub updated_channels: Vec<ChannelType>,
    /// Frontier scheduled for the next superstep.
    pub next_frontier: Vec<NodeKind>,
}

/// Step-by-step account of a completed run.
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    pub run_id: String,
    pub steps: Vec<StepReport>,
}

impl RunReport {
    #[must_use]
    pub fn total_steps(&self) -> u64 {
        self.steps.len() as u64
    }
}

/// Handle to a run driven on a background task.
///
/// The handle observes and controls the run without participating in it:
/// `committed_state` always reflects the last completed barrier, and
/// `cancel` stops the run between (or during) supersteps while leaving that
/// committed state intact.
pub struct RunHandle {
    pub(crate) task: JoinHandle<Result<VersionedState, RunnerError>>,
    pub(crate) committed: Arc<Mutex<VersionedState>>,
    pub(crate) status: Arc<Mutex<RunStatus>>,
}

impl RunHandle {
    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        *self.status.lock()
    }

    /// State as of the most recent barrier. Never includes updates from a
    /// superstep that was cancelled mid-flight.
    #[must_use]
    pub fn committed_state(&self) -> VersionedState {
        self.committed.lock().clone()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the run. In-flight node work is dropped; the last barrier's
    /// state remains observable through [`committed_state`](Self::committed_state).
    /// Cancelling a finished run changes nothing.
    pub fn cancel(&self) {
        if self.task.is_finished() {
            return;
        }
        // Decide under the lock: the runner may have marked the run
        // Completed or Failed since the is_finished check.
        let mut status = self.status.lock();
        if *status != RunStatus::Running {
            return;
        }
        self.task.abort();
        *status = RunStatus::Cancelled;
    }

    /// Waits for the run to end and returns its final state.
    pub async fn join(self) -> Result<VersionedState, RunnerError> {
        match self.task.await {
            Ok(result) => result,
            Err(join_err) if join_err.is_cancelled() => Err(RunnerError::Cancelled),
            Err(join_err) => Err(RunnerError::Driver(join_err.to_string())),
        }
    }
}

impl std::fmt::Debug for RunHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunHandle")
            .field("status", &self.status())
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}
