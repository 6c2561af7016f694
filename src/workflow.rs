//! The compiled, immutable workflow topology.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::graphs::Edge;
use crate::node::Node;
use crate::types::NodeKind;

/// An immutable workflow graph produced by
/// [`GraphBuilder::compile`](crate::graphs::GraphBuilder::compile).
///
/// Holds the entry node, the node registry, and the per-node edge table.
/// Execution lives in [`Executor`](crate::runtimes::Executor); a `Workflow`
/// is freely shareable across executors.
#[derive(Clone)]
pub struct Workflow {
    entry: NodeKind,
    nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    edges: FxHashMap<NodeKind, Edge>,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("entry", &self.entry)
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Workflow {
    /// Internal factory; topology is validated by the builder beforehand.
    pub(crate) fn from_parts(
        entry: NodeKind,
        nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
        edges: FxHashMap<NodeKind, Edge>,
    ) -> Self {
        Self {
            entry,
            nodes,
            edges,
        }
    }

    /// The node execution starts from.
    #[must_use]
    pub fn entry(&self) -> &NodeKind {
        &self.entry
    }

    /// Look up a node implementation by identity.
    #[must_use]
    pub fn node(&self, kind: &NodeKind) -> Option<&Arc<dyn Node>> {
        self.nodes.get(kind)
    }

    /// Look up a node's outgoing edge.
    #[must_use]
    pub fn edge(&self, kind: &NodeKind) -> Option<&Edge> {
        self.edges.get(kind)
    }

    /// Identities of every registered node.
    pub fn node_kinds(&self) -> impl Iterator<Item = &NodeKind> {
        self.nodes.keys()
    }
}
