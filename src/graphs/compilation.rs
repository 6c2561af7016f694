//! Graph compilation and build-time validation.
//!
//! All topology errors are caught here, before execution: a compiled
//! [`Workflow`] can always be walked without hitting a dangling reference.

use miette::Diagnostic;
use thiserror::Error;

use crate::types::NodeKind;
use crate::workflow::Workflow;

use super::edges::Edge;

/// Malformed topology, reported at build time and never at run time.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphConfigError {
    /// No edge leaves `NodeKind::Start`.
    #[error("no entry edge: add an edge from Start to the first node")]
    #[diagnostic(
        code(agentloop::graph::missing_entry),
        help("Use GraphBuilder::add_edge(NodeKind::Start, <entry node>).")
    )]
    MissingEntry,

    /// The entry edge from Start is a router rather than a fixed edge.
    #[error("the edge from Start must be unconditional")]
    #[diagnostic(code(agentloop::graph::routed_entry))]
    RoutedEntry,

    /// The entry edge names a node that was never registered.
    #[error("entry node {target} is not registered")]
    #[diagnostic(code(agentloop::graph::unknown_entry))]
    UnknownEntry { target: NodeKind },

    /// An unconditional edge points at an unregistered node.
    #[error("edge {from} -> {to} references unregistered node {to}")]
    #[diagnostic(code(agentloop::graph::unknown_edge_target))]
    UnknownEdgeTarget { from: NodeKind, to: NodeKind },

    /// A router label maps to an unregistered node.
    #[error("router on {from} maps label {label:?} to unregistered node {to}")]
    #[diagnostic(code(agentloop::graph::unknown_route_target))]
    UnknownRouteTarget {
        from: NodeKind,
        label: String,
        to: NodeKind,
    },

    /// An edge leaves a node that was never registered.
    #[error("edge leaves unregistered node {from}")]
    #[diagnostic(code(agentloop::graph::unknown_edge_source))]
    UnknownEdgeSource { from: NodeKind },

    /// A registered node has no outgoing edge.
    #[error("node {node} has no outgoing edge")]
    #[diagnostic(
        code(agentloop::graph::missing_edge),
        help("Every node needs a fixed successor or a router; route to End to halt.")
    )]
    MissingEdge { node: NodeKind },
}

impl super::builder::GraphBuilder {
    /// Validates the topology and compiles it into an executable
    /// [`Workflow`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphConfigError`] when the entry edge is missing or
    /// routed, when any edge or router label references an unregistered
    /// node, or when a registered node has no outgoing edge.
    pub fn compile(self) -> Result<Workflow, GraphConfigError> {
        let entry = match self.edges.get(&NodeKind::Start) {
            None => return Err(GraphConfigError::MissingEntry),
            Some(Edge::Routed(_)) => return Err(GraphConfigError::RoutedEntry),
            Some(Edge::To(target)) => target.clone(),
        };
        if !self.nodes.contains_key(&entry) {
            return Err(GraphConfigError::UnknownEntry { target: entry });
        }

        let registered = |kind: &NodeKind| kind.is_end() || self.nodes.contains_key(kind);

        for (from, edge) in &self.edges {
            if !from.is_start() && !self.nodes.contains_key(from) {
                return Err(GraphConfigError::UnknownEdgeSource { from: from.clone() });
            }
            match edge {
                Edge::To(to) => {
                    if !registered(to) {
                        return Err(GraphConfigError::UnknownEdgeTarget {
                            from: from.clone(),
                            to: to.clone(),
                        });
                    }
                }
                Edge::Routed(router_edge) => {
                    for (label, target) in router_edge.targets() {
                        if !registered(target) {
                            return Err(GraphConfigError::UnknownRouteTarget {
                                from: from.clone(),
                                label: label.to_string(),
                                to: target.clone(),
                            });
                        }
                    }
                }
            }
        }

        for node in self.nodes.keys() {
            if !self.edges.contains_key(node) {
                return Err(GraphConfigError::MissingEdge { node: node.clone() });
            }
        }

        Ok(Workflow::from_parts(entry, self.nodes, self.edges))
    }
}
