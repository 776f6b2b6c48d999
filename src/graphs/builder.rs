//! Fluent construction of execution graphs.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::graphs::edges::{ConditionalEdge, EdgePredicate};
use crate::node::{Capability, Node, StreamingNode};
use crate::types::NodeKind;

/// Mutable description of a graph before compilation.
///
/// Nothing is validated here; [`compile`](GraphBuilder::compile) checks the
/// whole description at once and reports the first structural problem.
///
/// # Examples
///
/// ```
/// # use warpgraph::graphs::GraphBuilder;
/// # use warpgraph::node::{Node, NodeContext, NodeError, NodePartial};
/// # use warpgraph::state::StateSnapshot;
/// # use warpgraph::types::NodeKind;
/// # use async_trait::async_trait;
/// # struct Noop;
/// # #[async_trait]
/// # impl Node for Noop {
/// #     async fn run(
/// #         &self,
/// #         _snapshot: StateSnapshot,
/// #         _ctx: NodeContext,
/// #     ) -> Result<NodePartial, NodeError> {
/// #         Ok(NodePartial::new())
/// #     }
/// # }
/// let graph = GraphBuilder::new()
///     .add_node("agent", Noop)
///     .add_node("tools", Noop)
///     .add_edge("tools", "agent")
///     .add_conditional_edge(
///         "agent",
///         std::sync::Arc::new(|snap: &StateSnapshot| {
///             if snap.pending_tool_calls().is_empty() {
///                 NodeKind::End
///             } else {
///                 "tools".into()
///             }
///         }),
///         vec!["tools".into(), NodeKind::End],
///     )
///     .set_entry("agent")
///     .compile()
///     .unwrap();
/// ```
#[derive(Default)]
pub struct GraphBuilder {
    pub(crate) nodes: FxHashMap<NodeKind, Capability>,
    pub(crate) edges: FxHashMap<NodeKind, Vec<NodeKind>>,
    pub(crate) conditional_edges: Vec<ConditionalEdge>,
    pub(crate) entry: Option<NodeKind>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a direct node under `kind`, replacing any previous
    /// registration for the same kind.
    #[must_use]
    pub fn add_node(mut self, kind: impl Into<NodeKind>, node: impl Node + 'static) -> Self {
        self.nodes
            .insert(kind.into(), Capability::Direct(Arc::new(node)));
        self
    }

    /// Registers a streaming node under `kind`.
    #[must_use]
    pub fn add_streaming_node(
        mut self,
        kind: impl Into<NodeKind>,
        node: impl StreamingNode + 'static,
    ) -> Self {
        self.nodes
            .insert(kind.into(), Capability::Streaming(Arc::new(node)));
        self
    }

    /// Adds a static edge. Static edges always fire and take precedence over
    /// any conditional edge from the same node.
    #[must_use]
    pub fn add_edge(mut self, from: impl Into<NodeKind>, to: impl Into<NodeKind>) -> Self {
        self.edges.entry(from.into()).or_default().push(to.into());
        self
    }

    /// Adds a conditional edge from `from`. After each barrier the predicate
    /// inspects committed state and picks one of `allowed_targets`.
    #[must_use]
    pub fn add_conditional_edge(
        mut self,
        from: impl Into<NodeKind>,
        predicate: EdgePredicate,
        allowed_targets: Vec<NodeKind>,
    ) -> Self {
        self.conditional_edges
            .push(ConditionalEdge::new(from.into(), predicate, allowed_targets));
        self
    }

    /// Names the node every run starts from.
    #[must_use]
    pub fn set_entry(mut self, entry: impl Into<NodeKind>) -> Self {
        self.entry = Some(entry.into());
        self
    }
}

impl std::fmt::Debug for GraphBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphBuilder")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("edges", &self.edges)
            .field("conditional_edges", &self.conditional_edges.len())
            .field("entry", &self.entry)
            .finish()
    }
}
