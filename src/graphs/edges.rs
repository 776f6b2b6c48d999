//! Edge types: static successors and state-dependent conditional routing.

use std::sync::Arc;

use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// Routing function for a conditional edge. Inspects the committed state
/// after a barrier and names the successor to schedule.
pub type EdgePredicate = Arc<dyn Fn(&StateSnapshot) -> NodeKind + Send + Sync>;

/// A conditional edge with a declared set of legal targets.
///
/// Declaring targets up front lets compilation check that every possible
/// destination exists, and lets the runner reject a predicate that returns
/// a node outside the declared set.
#[derive(Clone)]
pub struct ConditionalEdge {
    from: NodeKind,
    predicate: EdgePredicate,
    allowed_targets: Vec<NodeKind>,
}

impl ConditionalEdge {
    #[must_use]
    pub fn new(from: NodeKind, predicate: EdgePredicate, allowed_targets: Vec<NodeKind>) -> Self {
        Self {
            from,
            predicate,
            allowed_targets,
        }
    }

    #[must_use]
    pub fn from(&self) -> &NodeKind {
        &self.from
    }

    #[must_use]
    pub fn allowed_targets(&self) -> &[NodeKind] {
        &self.allowed_targets
    }

    /// Runs the predicate against `snapshot`.
    #[must_use]
    pub fn decide(&self, snapshot: &StateSnapshot) -> NodeKind {
        (self.predicate)(snapshot)
    }

    /// Whether `target` is a legal routing result. `End` is always legal;
    /// anything else must be in the declared target set.
    #[must_use]
    pub fn allows(&self, target: &NodeKind) -> bool {
        target.is_end() || self.allowed_targets.contains(target)
    }
}

impl std::fmt::Debug for ConditionalEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalEdge")
            .field("from", &self.from)
            .field("allowed_targets", &self.allowed_targets)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decide_and_allows_work_together() {
        let edge = ConditionalEdge::new(
            NodeKind::Custom("agent".into()),
            Arc::new(|snap: &StateSnapshot| {
                if snap.pending_tool_calls().is_empty() {
                    NodeKind::End
                } else {
                    NodeKind::Custom("tools".into())
                }
            }),
            vec![NodeKind::Custom("tools".into()), NodeKind::End],
        );
        let empty = StateSnapshot::default();
        let target = edge.decide(&empty);
        assert_eq!(target, NodeKind::End);
        assert!(edge.allows(&target));
        assert!(!edge.allows(&NodeKind::Custom("other".into())));
    }
}
