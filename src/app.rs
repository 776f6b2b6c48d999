//! The compiled, executable graph.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::channels::Channel;
use crate::event_bus::{EventBus, EventStream, StreamMode};
use crate::graphs::edges::ConditionalEdge;
use crate::node::Capability;
use crate::reducers::ReducerRegistry;
use crate::runtime::config::RunConfig;
use crate::runtime::run::{RunHandle, RunReport, RunStatus};
use crate::runtime::runner::{GraphRunner, RunnerError};
use crate::runtime::scheduler::NodeOutcome;
use crate::state::VersionedState;
use crate::types::{ChannelType, NodeKind};

/// Immutable, executable form of a graph.
///
/// Produced by [`GraphBuilder::compile`](crate::graphs::GraphBuilder::compile)
/// and cheap to clone; clones share the same node registrations, edges, and
/// reducers, so one compiled graph can drive any number of concurrent runs.
#[derive(Clone)]
pub struct CompiledGraph {
    inner: Arc<GraphInner>,
}

struct GraphInner {
    nodes: FxHashMap<NodeKind, Capability>,
    edges: FxHashMap<NodeKind, Vec<NodeKind>>,
    conditional_edges: Vec<ConditionalEdge>,
    entry: NodeKind,
    reducers: ReducerRegistry,
}

/// What a barrier changed.
#[derive(Debug)]
pub struct BarrierOutcome {
    /// Channels whose data changed this superstep, in fixed channel order.
    pub updated_channels: Vec<ChannelType>,
}

impl CompiledGraph {
    pub(crate) fn from_parts(
        nodes: FxHashMap<NodeKind, Capability>,
        edges: FxHashMap<NodeKind, Vec<NodeKind>>,
        conditional_edges: Vec<ConditionalEdge>,
        entry: NodeKind,
    ) -> Self {
        Self {
            inner: Arc::new(GraphInner {
                nodes,
                edges,
                conditional_edges,
                entry,
                reducers: ReducerRegistry::default(),
            }),
        }
    }

    /// The node every run starts from.
    #[must_use]
    pub fn entry(&self) -> &NodeKind {
        &self.inner.entry
    }

    pub(crate) fn capabilities(&self) -> &FxHashMap<NodeKind, Capability> {
        &self.inner.nodes
    }

    /// Static successors of `node`, if any were declared.
    pub(crate) fn static_targets(&self, node: &NodeKind) -> Option<&Vec<NodeKind>> {
        self.inner.edges.get(node)
    }

    /// Conditional edges departing `node`, in declaration order.
    pub(crate) fn conditional_edges_from<'a>(
        &'a self,
        node: &'a NodeKind,
    ) -> impl Iterator<Item = &'a ConditionalEdge> {
        self.inner
            .conditional_edges
            .iter()
            .filter(move |edge| edge.from() == node)
    }

    /// Commits one superstep's partials into `state`.
    ///
    /// Partials apply through the channel reducers in frontier order, so the
    /// result is deterministic for a given frontier regardless of task
    /// completion order. Versions bump once per channel that changed, never
    /// per partial.
    pub fn apply_barrier(
        &self,
        state: &mut VersionedState,
        outcomes: &[NodeOutcome],
    ) -> BarrierOutcome {
        let mut updated_channels: Vec<ChannelType> = Vec::new();
        for outcome in outcomes {
            for channel in self.inner.reducers.apply_all(state, &outcome.partial) {
                if !updated_channels.contains(&channel) {
                    updated_channels.push(channel);
                }
            }
        }
        for channel in &updated_channels {
            match channel {
                ChannelType::Message => {
                    let v = state.messages.version();
                    state.messages.set_version(v + 1);
                }
                ChannelType::Extra => {
                    let v = state.extra.version();
                    state.extra.set_version(v + 1);
                }
                ChannelType::Error => {
                    let v = state.errors.version();
                    state.errors.set_version(v + 1);
                }
            }
        }
        BarrierOutcome { updated_channels }
    }

    /// Runs the graph to completion with default configuration, returning
    /// the final state. No events are published.
    pub async fn invoke(&self, state: VersionedState) -> Result<VersionedState, RunnerError> {
        self.invoke_with(state, RunConfig::new()).await
    }

    /// [`invoke`](Self::invoke) with explicit configuration.
    pub async fn invoke_with(
        &self,
        state: VersionedState,
        config: RunConfig,
    ) -> Result<VersionedState, RunnerError> {
        GraphRunner::new(self.clone(), config).run(state).await
    }

    /// Runs to completion and also returns the step-by-step [`RunReport`].
    pub async fn invoke_with_report(
        &self,
        state: VersionedState,
        config: RunConfig,
    ) -> Result<(VersionedState, RunReport), RunnerError> {
        GraphRunner::new(self.clone(), config)
            .run_with_report(state)
            .await
    }

    /// Starts the run on a background task and returns a handle plus the
    /// event subscription for `mode`. Must be called within a tokio runtime.
    #[must_use]
    pub fn stream(&self, state: VersionedState, mode: StreamMode) -> (RunHandle, EventStream) {
        self.stream_with(state, mode, RunConfig::new())
    }

    /// [`stream`](Self::stream) with explicit configuration.
    #[must_use]
    pub fn stream_with(
        &self,
        state: VersionedState,
        mode: StreamMode,
        config: RunConfig,
    ) -> (RunHandle, EventStream) {
        let bus = EventBus::new();
        let events = bus.subscribe(mode);
        let committed = Arc::new(Mutex::new(state.clone()));
        let status = Arc::new(Mutex::new(RunStatus::Running));
        let runner = GraphRunner::new(self.clone(), config)
            .with_emitter(bus.emitter())
            .with_observers(committed.clone(), status.clone());
        let task = tokio::spawn(async move {
            let result = runner.run(state).await;
            bus.close().await;
            result
        });
        (
            RunHandle {
                task,
                committed,
                status,
            },
            events,
        )
    }
}

impl std::fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("entry", &self.inner.entry)
            .field("nodes", &self.inner.nodes.keys().collect::<Vec<_>>())
            .field("conditional_edges", &self.inner.conditional_edges.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::errors::{ErrorDetail, ErrorEvent};
    use crate::graphs::GraphBuilder;
    use crate::message::Message;
    use crate::node::{Node, NodeContext, NodeError, NodePartial};
    use crate::runtime::Disposition;
    use crate::state::StateSnapshot;
    use async_trait::async_trait;

    struct Echo(&'static str);

    #[async_trait]
    impl Node for Echo {
        async fn run(
            &self,
            _snapshot: StateSnapshot,
            _ctx: NodeContext,
        ) -> Result<NodePartial, NodeError> {
            Ok(NodePartial::new().with_messages(vec![Message::assistant(self.0)]))
        }
    }

    fn two_node_graph() -> CompiledGraph {
        GraphBuilder::new()
            .add_node("a", Echo("from a"))
            .add_node("b", Echo("from b"))
            .add_edge("a", "b")
            .add_edge("b", NodeKind::End)
            .set_entry("a")
            .compile()
            .expect("compiles")
    }

    #[test]
    fn barrier_bumps_versions_only_on_change() {
        let graph = two_node_graph();
        let mut state = VersionedState::new_with_user_message("hi");

        let outcome = graph.apply_barrier(
            &mut state,
            &[NodeOutcome {
                node: NodeKind::Custom("a".into()),
                partial: NodePartial::new().with_messages(vec![Message::assistant("x")]),
                disposition: Disposition::Completed,
            }],
        );
        assert_eq!(outcome.updated_channels, vec![ChannelType::Message]);
        assert_eq!(state.messages.version(), 2);
        assert_eq!(state.extra.version(), 1);

        let noop = graph.apply_barrier(
            &mut state,
            &[NodeOutcome {
                node: NodeKind::Custom("a".into()),
                partial: NodePartial::new(),
                disposition: Disposition::Completed,
            }],
        );
        assert!(noop.updated_channels.is_empty());
        assert_eq!(state.messages.version(), 2);
    }

    #[test]
    fn barrier_applies_in_frontier_order() {
        let graph = two_node_graph();
        let mut state = VersionedState::new_with_user_message("hi");
        graph.apply_barrier(
            &mut state,
            &[
                NodeOutcome {
                    node: NodeKind::Custom("a".into()),
                    partial: NodePartial::new()
                        .with_messages(vec![Message::with_id("m", Message::ASSISTANT, "first")]),
                    disposition: Disposition::Completed,
                },
                NodeOutcome {
                    node: NodeKind::Custom("b".into()),
                    partial: NodePartial::new()
                        .with_messages(vec![Message::with_id("m", Message::ASSISTANT, "second")]),
                    disposition: Disposition::Completed,
                },
            ],
        );
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages.get()[1].content, "second");
    }

    #[test]
    fn failed_node_partials_still_reach_the_errors_channel() {
        let graph = two_node_graph();
        let mut state = VersionedState::new_with_user_message("hi");
        graph.apply_barrier(
            &mut state,
            &[NodeOutcome {
                node: NodeKind::Custom("a".into()),
                partial: NodePartial::new().with_errors(vec![ErrorEvent::node(
                    NodeKind::Custom("a".into()),
                    1,
                    ErrorDetail::new("boom"),
                )]),
                disposition: Disposition::TimedOut,
            }],
        );
        assert_eq!(state.errors.len(), 1);
        assert_eq!(state.errors.version(), 2);
    }

    #[tokio::test]
    async fn invoke_runs_linear_graph_to_completion() {
        let graph = two_node_graph();
        let final_state = graph
            .invoke(VersionedState::new_with_user_message("hi"))
            .await
            .expect("run completes");
        let contents: Vec<&str> = final_state
            .messages
            .get()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["hi", "from a", "from b"]);
    }
}
