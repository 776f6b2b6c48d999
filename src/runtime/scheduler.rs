//! Frontier execution: spawning node tasks and collecting their partials.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use rustc_hash::FxHashMap;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::channels::errors::{ErrorDetail, ErrorEvent};
use crate::event_bus::{Event, EventEmitter, StreamFragmentEvent};
use crate::node::{Capability, NodeContext, NodeError, NodePartial};
use crate::runtime::config::RunConfig;
use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// How one node's invocation ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Node returned its partial normally.
    Completed,
    /// Node exceeded the configured timeout. Its partial carries only the
    /// recorded failure; the run continues without its successors.
    TimedOut,
    /// Node errored or panicked. The run fails after this superstep's
    /// barrier commits.
    Failed(String),
}

/// What one node produced during a superstep.
#[derive(Clone, Debug)]
pub struct NodeOutcome {
    pub node: NodeKind,
    /// The partial the barrier should apply. For a timed-out or failed node
    /// this carries the recorded error event.
    pub partial: NodePartial,
    pub disposition: Disposition,
}

impl NodeOutcome {
    /// True when this node's successors should be scheduled.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.disposition == Disposition::Completed
    }
}

enum NodeFailure {
    Error(NodeError),
    Timeout(Duration),
    Panic(String),
}

impl NodeFailure {
    fn detail(&self) -> ErrorDetail {
        match self {
            NodeFailure::Error(err) => ErrorDetail::new(err.to_string()),
            NodeFailure::Timeout(budget) => {
                ErrorDetail::new(format!("node exceeded its {budget:?} budget"))
            }
            NodeFailure::Panic(msg) => ErrorDetail::new(format!("node panicked: {msg}")),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            NodeFailure::Error(_) => "error",
            NodeFailure::Timeout(_) => "timeout",
            NodeFailure::Panic(_) => "panic",
        }
    }
}

/// Runs frontiers one superstep at a time.
///
/// Every node in the frontier is spawned concurrently; results are joined in
/// frontier order so the barrier sees a deterministic sequence regardless of
/// which task finishes first.
#[derive(Clone, Debug)]
pub struct Scheduler {
    config: RunConfig,
}

impl Scheduler {
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Executes `frontier` against `snapshot`, producing one outcome per
    /// node, in frontier order.
    ///
    /// A failure never fails the superstep itself: the whole frontier runs
    /// to completion and every failure is turned into an error event on that
    /// node's partial. The runner decides, per disposition, whether the run
    /// continues.
    #[instrument(skip_all, fields(step, frontier = frontier.len()))]
    pub async fn run_step(
        &self,
        frontier: &[NodeKind],
        capabilities: &FxHashMap<NodeKind, Capability>,
        snapshot: StateSnapshot,
        step: u64,
        emitter: Arc<dyn EventEmitter>,
    ) -> Vec<NodeOutcome> {
        let mut handles: Vec<(NodeKind, JoinHandle<Result<NodePartial, NodeFailure>>)> =
            Vec::with_capacity(frontier.len());

        for kind in frontier {
            // Compilation guarantees every frontier node is registered.
            let Some(capability) = capabilities.get(kind).cloned() else {
                continue;
            };
            let ctx = NodeContext::new(kind.clone(), step, self.config.clone(), emitter.clone());
            let _ = emitter.emit(Event::node_lifecycle(kind.clone(), step, "start"));
            let task_snapshot = snapshot.clone();
            let task_emitter = emitter.clone();
            let task_kind = kind.clone();
            let timeout = self.config.node_timeout;
            handles.push((
                kind.clone(),
                tokio::spawn(async move {
                    let work = run_capability(
                        capability,
                        task_snapshot,
                        ctx,
                        task_kind,
                        step,
                        task_emitter,
                    );
                    match timeout {
                        Some(budget) => match tokio::time::timeout(budget, work).await {
                            Ok(result) => result,
                            Err(_) => Err(NodeFailure::Timeout(budget)),
                        },
                        None => work.await,
                    }
                }),
            ));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (kind, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(NodeFailure::Panic(join_err.to_string())),
            };
            match result {
                Ok(partial) => {
                    let _ = emitter.emit(Event::node_lifecycle(kind.clone(), step, "done"));
                    debug!(node = %kind, step, "node completed");
                    outcomes.push(NodeOutcome {
                        node: kind,
                        partial,
                        disposition: Disposition::Completed,
                    });
                }
                Err(failure) => {
                    let _ = emitter.emit(Event::node_lifecycle(
                        kind.clone(),
                        step,
                        failure.label(),
                    ));
                    debug!(node = %kind, step, failure = failure.label(), "node failed");
                    let detail = failure.detail();
                    let message = detail.message.clone();
                    let partial = NodePartial::new().with_errors(vec![ErrorEvent::node(
                        kind.clone(),
                        step,
                        detail,
                    )
                    .with_tag(failure.label())]);
                    let disposition = match failure {
                        NodeFailure::Timeout(_) => Disposition::TimedOut,
                        _ => Disposition::Failed(message),
                    };
                    outcomes.push(NodeOutcome {
                        node: kind,
                        partial,
                        disposition,
                    });
                }
            }
        }
        outcomes
    }
}

/// Drives one capability to a single folded partial.
///
/// Streaming nodes surface every fragment on the event stream as it arrives,
/// tagged with the producing node and its fragment sequence number, then fold
/// into the partial the barrier will apply.
async fn run_capability(
    capability: Capability,
    snapshot: StateSnapshot,
    ctx: NodeContext,
    kind: NodeKind,
    step: u64,
    emitter: Arc<dyn EventEmitter>,
) -> Result<NodePartial, NodeFailure> {
    match capability {
        Capability::Direct(node) => node
            .run(snapshot, ctx)
            .await
            .map_err(NodeFailure::Error),
        Capability::Streaming(node) => {
            let mut fragments = node
                .stream(snapshot, ctx)
                .await
                .map_err(NodeFailure::Error)?;
            let mut folded = NodePartial::new();
            let mut seq = 0u64;
            while let Some(fragment) = fragments.next().await {
                let fragment = fragment.map_err(NodeFailure::Error)?;
                let _ = emitter.emit(Event::Stream(StreamFragmentEvent {
                    node: kind.clone(),
                    step,
                    seq,
                    fragment: fragment.clone(),
                }));
                folded.merge(fragment);
                seq += 1;
            }
            Ok(folded)
        }
    }
}
