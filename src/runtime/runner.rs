//! The superstep loop: schedule, barrier, route, repeat.

use std::sync::Arc;

use miette::Diagnostic;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::app::CompiledGraph;
use crate::event_bus::{
    EmitterError, Event, EventEmitter, NoopEmitter, StateUpdateEvent, ValuesEvent, RUN_END_SCOPE,
};
use crate::runtime::config::RunConfig;
use crate::runtime::run::{RunReport, RunStatus, StepReport};
use crate::runtime::scheduler::{Disposition, Scheduler};
use crate::state::VersionedState;
use crate::types::NodeKind;

/// Failures that end a run.
///
/// Tool failures and node timeouts never appear here; those are recorded on
/// the errors channel and the run continues. A `RunnerError` means the run
/// itself stopped.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    #[error("conditional edge from `{from}` chose `{target}` at step {step}, which is not in its allowed targets")]
    #[diagnostic(
        code(warpgraph::runner::routing),
        help("declare every target the predicate can return when adding the conditional edge")
    )]
    Routing {
        from: NodeKind,
        target: NodeKind,
        step: u64,
    },

    #[error("node `{node}` failed at step {step}: {message}")]
    #[diagnostic(
        code(warpgraph::runner::node_execution),
        help("the error event is recorded on the errors channel; partial state up to this barrier is retained")
    )]
    NodeExecution {
        node: NodeKind,
        step: u64,
        message: String,
    },

    #[error("run exceeded the step limit of {limit}")]
    #[diagnostic(
        code(warpgraph::runner::step_limit),
        help("raise the limit via RunConfig or the WARPGRAPH_STEP_LIMIT variable, or check the graph's exit condition")
    )]
    StepLimitExceeded { limit: u64 },

    #[error("run was cancelled")]
    #[diagnostic(code(warpgraph::runner::cancelled))]
    Cancelled,

    #[error("event stream interrupted")]
    #[diagnostic(code(warpgraph::runner::stream_interrupted))]
    StreamInterrupted(#[from] EmitterError),

    #[error("run driver failed: {0}")]
    #[diagnostic(code(warpgraph::runner::driver))]
    Driver(String),
}

/// Drives one run of a compiled graph to completion.
pub struct GraphRunner {
    graph: CompiledGraph,
    config: RunConfig,
    emitter: Arc<dyn EventEmitter>,
    committed: Option<Arc<Mutex<VersionedState>>>,
    status: Option<Arc<Mutex<RunStatus>>>,
}

impl GraphRunner {
    #[must_use]
    pub fn new(graph: CompiledGraph, config: RunConfig) -> Self {
        Self {
            graph,
            config,
            emitter: Arc::new(NoopEmitter),
            committed: None,
            status: None,
        }
    }

    #[must_use]
    pub fn with_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// Shares the committed-state and status cells with a [`RunHandle`].
    pub(crate) fn with_observers(
        mut self,
        committed: Arc<Mutex<VersionedState>>,
        status: Arc<Mutex<RunStatus>>,
    ) -> Self {
        self.committed = Some(committed);
        self.status = Some(status);
        self
    }

    /// Runs supersteps until the frontier drains, the step fuse blows, or
    /// routing fails.
    ///
    /// Each superstep: snapshot state, execute the whole frontier, commit
    /// every node's partial at the barrier in frontier order, then route on
    /// the post-barrier state. Static edges always fire and take precedence
    /// over conditional edges from the same node; a node with no outgoing
    /// edges ends its branch.
    pub async fn run(&self, state: VersionedState) -> Result<VersionedState, RunnerError> {
        self.run_with_report(state).await.map(|(state, _)| state)
    }

    /// [`run`](Self::run), additionally returning a per-step account of what
    /// executed and what changed.
    #[instrument(skip_all, fields(run_id = %self.config.run_id))]
    pub async fn run_with_report(
        &self,
        mut state: VersionedState,
    ) -> Result<(VersionedState, RunReport), RunnerError> {
        let run_id = self.config.run_id.clone();
        let mut report = RunReport {
            run_id: run_id.clone(),
            steps: Vec::new(),
        };
        let scheduler = Scheduler::new(self.config.clone());
        let mut frontier = vec![self.graph.entry().clone()];
        let mut step: u64 = 0;
        info!(entry = %frontier[0], "run started");
        self.emitter
            .emit(Event::diagnostic("runner", format!("run {run_id} started")))?;

        while !frontier.is_empty() {
            step += 1;
            if step > self.config.step_limit {
                let limit = self.config.step_limit;
                return Err(self.fail(RunnerError::StepLimitExceeded { limit }));
            }

            let outcomes = scheduler
                .run_step(
                    &frontier,
                    self.graph.capabilities(),
                    state.snapshot(),
                    step,
                    self.emitter.clone(),
                )
                .await;

            // Commit the barrier before telling anyone about the deltas, so
            // an observer reacting to an Update event always sees the state
            // that already contains it.
            let barrier = self.graph.apply_barrier(&mut state, &outcomes);
            debug!(step, updated = ?barrier.updated_channels, "barrier committed");
            if let Some(committed) = &self.committed {
                *committed.lock() = state.clone();
            }
            for outcome in &outcomes {
                self.emitter.emit(Event::Update(StateUpdateEvent {
                    node: outcome.node.clone(),
                    step,
                    update: outcome.partial.clone(),
                }))?;
            }

            // A failed node ends the run, but only after its barrier: the
            // error event and every sibling's partial stay committed.
            if let Some(failed) = outcomes
                .iter()
                .find(|o| matches!(o.disposition, Disposition::Failed(_)))
            {
                let Disposition::Failed(message) = &failed.disposition else {
                    unreachable!();
                };
                return Err(self.fail(RunnerError::NodeExecution {
                    node: failed.node.clone(),
                    step,
                    message: message.clone(),
                }));
            }

            frontier = self.route(&outcomes, &state, step)?;
            report.steps.push(StepReport {
                step,
                ran: outcomes.iter().map(|o| o.node.clone()).collect(),
                updated_channels: barrier.updated_channels,
                next_frontier: frontier.clone(),
            });
        }

        info!(steps = step, "run completed");
        if let Some(status) = &self.status {
            *status.lock() = RunStatus::Completed;
        }
        // Values subscribers get exactly one snapshot: the final state.
        self.emitter.emit(Event::Values(ValuesEvent {
            step,
            snapshot: state.snapshot(),
        }))?;
        self.emitter.emit(Event::diagnostic(
            RUN_END_SCOPE,
            format!("run {run_id} completed after {step} steps"),
        ))?;
        Ok((state, report))
    }

    /// Computes the next frontier from this superstep's outcomes.
    fn route(
        &self,
        outcomes: &[crate::runtime::scheduler::NodeOutcome],
        state: &VersionedState,
        step: u64,
    ) -> Result<Vec<NodeKind>, RunnerError> {
        let snapshot = state.snapshot();
        let mut next: Vec<NodeKind> = Vec::new();
        let push = |kind: &NodeKind, next: &mut Vec<NodeKind>| {
            if !kind.is_end() && !next.contains(kind) {
                next.push(kind.clone());
            }
        };

        for outcome in outcomes {
            if !outcome.completed() {
                continue;
            }
            let node = &outcome.node;
            if let Some(targets) = self.graph.static_targets(node) {
                for target in targets {
                    push(target, &mut next);
                }
                continue;
            }
            for edge in self.graph.conditional_edges_from(node) {
                let target = edge.decide(&snapshot);
                if !edge.allows(&target) {
                    return Err(self.fail(RunnerError::Routing {
                        from: node.clone(),
                        target,
                        step,
                    }));
                }
                push(&target, &mut next);
            }
        }
        Ok(next)
    }

    /// Marks the run failed and announces run end before returning `err`.
    fn fail(&self, err: RunnerError) -> RunnerError {
        if let Some(status) = &self.status {
            *status.lock() = RunStatus::Failed;
        }
        let _ = self.emitter.emit(Event::diagnostic(
            RUN_END_SCOPE,
            format!("run {} failed: {err}", self.config.run_id),
        ));
        err
    }
}
