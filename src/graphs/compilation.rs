//! Graph validation and compilation.
//!
//! Compilation is the single gate between a mutable [`GraphBuilder`] and an
//! executable [`CompiledGraph`]. Every structural error a graph can have is
//! caught here; a graph that compiles can only fail at runtime for dynamic
//! reasons (a predicate misbehaving, a node erroring, the step fuse).

use miette::Diagnostic;
use thiserror::Error;

use crate::app::CompiledGraph;
use crate::graphs::builder::GraphBuilder;
use crate::types::NodeKind;

/// Structural problems detected at compile time.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphValidationError {
    #[error("graph has no entry point; call set_entry before compiling")]
    #[diagnostic(code(warpgraph::graph::missing_entry))]
    MissingEntry,

    #[error("entry point `{0}` is not a registered node")]
    #[diagnostic(
        code(warpgraph::graph::unknown_entry),
        help("register the node with add_node, or point set_entry at an existing node")
    )]
    UnknownEntry(NodeKind),

    #[error("edge starts at `{0}`, which is not a registered node")]
    #[diagnostic(code(warpgraph::graph::unknown_edge_source))]
    UnknownEdgeSource(NodeKind),

    #[error("edge `{from}` -> `{to}` targets an unregistered node")]
    #[diagnostic(
        code(warpgraph::graph::unknown_edge_target),
        help("every edge target must be a registered node or the End sentinel")
    )]
    UnknownEdgeTarget { from: NodeKind, to: NodeKind },

    #[error("conditional edge starts at `{0}`, which is not a registered node")]
    #[diagnostic(code(warpgraph::graph::unknown_conditional_source))]
    UnknownConditionalSource(NodeKind),

    #[error("conditional edge from `{0}` declares no allowed targets")]
    #[diagnostic(
        code(warpgraph::graph::empty_allowed_targets),
        help("a conditional edge must declare at least one target it may route to")
    )]
    EmptyAllowedTargets(NodeKind),

    #[error("conditional edge from `{from}` allows `{target}`, which is not a registered node")]
    #[diagnostic(code(warpgraph::graph::unknown_allowed_target))]
    UnknownAllowedTarget { from: NodeKind, target: NodeKind },
}

impl GraphBuilder {
    /// Validates the graph description and freezes it into a
    /// [`CompiledGraph`].
    ///
    /// Checks, in order: an entry exists and names a registered node; every
    /// static edge connects registered nodes (End is a legal target, never a
    /// source); every conditional edge starts at a registered node and
    /// declares a non-empty target set of registered nodes or End. Cycles
    /// pass validation; termination is the step fuse's concern.
    pub fn compile(self) -> Result<CompiledGraph, GraphValidationError> {
        let entry = self.entry.clone().ok_or(GraphValidationError::MissingEntry)?;
        if !self.nodes.contains_key(&entry) {
            return Err(GraphValidationError::UnknownEntry(entry));
        }

        let registered = |kind: &NodeKind| kind.is_end() || self.nodes.contains_key(kind);

        for (from, targets) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(GraphValidationError::UnknownEdgeSource(from.clone()));
            }
            for to in targets {
                if !registered(to) {
                    return Err(GraphValidationError::UnknownEdgeTarget {
                        from: from.clone(),
                        to: to.clone(),
                    });
                }
            }
        }

        for edge in &self.conditional_edges {
            if !self.nodes.contains_key(edge.from()) {
                return Err(GraphValidationError::UnknownConditionalSource(
                    edge.from().clone(),
                ));
            }
            if edge.allowed_targets().is_empty() {
                return Err(GraphValidationError::EmptyAllowedTargets(edge.from().clone()));
            }
            for target in edge.allowed_targets() {
                if !registered(target) {
                    return Err(GraphValidationError::UnknownAllowedTarget {
                        from: edge.from().clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        Ok(CompiledGraph::from_parts(
            self.nodes,
            self.edges,
            self.conditional_edges,
            entry,
        ))
    }
}
