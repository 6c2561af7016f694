//! GraphBuilder: fluent construction of workflow graphs.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::edges::{Edge, Router, RouterEdge};
use crate::node::Node;
use crate::types::NodeKind;

/// Builder for workflow graphs.
///
/// Every graph needs at least one executable node, an entry edge from
/// `NodeKind::Start`, and for each node exactly one outgoing edge, either
/// fixed (`add_edge`) or routed (`add_router`). `NodeKind::Start` and
/// `NodeKind::End` are virtual endpoints and must never be registered as
/// executable nodes.
///
/// # Examples
///
/// ```
/// use agentloop::graphs::GraphBuilder;
/// use agentloop::types::NodeKind;
/// # use agentloop::node::{Node, NodeContext, NodeError};
/// # use agentloop::state::{SessionState, StateDelta};
/// # use async_trait::async_trait;
/// # struct MyNode;
/// # #[async_trait]
/// # impl Node for MyNode {
/// #     async fn run(&self, _: &SessionState, _: &NodeContext) -> Result<StateDelta, NodeError> {
/// #         Ok(StateDelta::new())
/// #     }
/// # }
///
/// let workflow = GraphBuilder::new()
///     .add_node("worker".into(), MyNode)
///     .add_edge(NodeKind::Start, "worker".into())
///     .add_edge("worker".into(), NodeKind::End)
///     .compile()
///     .expect("valid graph");
/// # let _ = workflow;
/// ```
pub struct GraphBuilder {
    pub(super) nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    pub(super) edges: FxHashMap<NodeKind, Edge>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Creates a new, empty graph builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
        }
    }

    /// Registers an executable node under the given identifier.
    ///
    /// `NodeKind::Start` and `NodeKind::End` are virtual; attempts to
    /// register them are ignored with a warning.
    #[must_use]
    pub fn add_node(mut self, id: NodeKind, node: impl Node + 'static) -> Self {
        match id {
            NodeKind::Start | NodeKind::End => {
                tracing::warn!(?id, "ignoring registration of virtual node kind");
            }
            _ => {
                self.nodes.insert(id, Arc::new(node));
            }
        }
        self
    }

    /// Adds an unconditional edge. A node's previous outgoing edge, if any,
    /// is replaced.
    #[must_use]
    pub fn add_edge(mut self, from: NodeKind, to: NodeKind) -> Self {
        self.edges.insert(from, Edge::To(to));
        self
    }

    /// Adds a routed edge: after `from` runs, `router` produces a label that
    /// is resolved through `targets`.
    ///
    /// Map the [`HALT`](super::HALT) label to `NodeKind::End` to let the
    /// router halt the loop.
    #[must_use]
    pub fn add_router<S, I>(
        mut self,
        from: NodeKind,
        router: impl Router + 'static,
        targets: I,
    ) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, NodeKind)>,
    {
        let table: FxHashMap<String, NodeKind> = targets
            .into_iter()
            .map(|(label, target)| (label.into(), target))
            .collect();
        self.edges
            .insert(from, Edge::Routed(RouterEdge::new(Arc::new(router), table)));
        self
    }

    /// Like [`add_router`](Self::add_router), with a fallback target for
    /// labels outside the table.
    #[must_use]
    pub fn add_router_with_default<S, I>(
        mut self,
        from: NodeKind,
        router: impl Router + 'static,
        targets: I,
        default: NodeKind,
    ) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, NodeKind)>,
    {
        let table: FxHashMap<String, NodeKind> = targets
            .into_iter()
            .map(|(label, target)| (label.into(), target))
            .collect();
        self.edges.insert(
            from,
            Edge::Routed(RouterEdge::new(Arc::new(router), table).with_default(default)),
        );
        self
    }
}
