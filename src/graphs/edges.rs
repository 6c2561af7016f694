//! Edge variants and routing for conditional graph flow.
//!
//! Every node has exactly one outgoing [`Edge`]: either a fixed successor or
//! a [`RouterEdge`] that maps a router's output label to a target through an
//! explicit finite table. The label [`HALT`] conventionally maps to
//! [`NodeKind::End`].

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::state::SessionState;
use crate::types::NodeKind;

/// Conventional router label that halts the loop.
pub const HALT: &str = "END";

/// Selects the next node from the current session state.
///
/// Routers are pure functions of state: the same state always yields the
/// same label. Closures implement the trait directly:
///
/// ```
/// use agentloop::graphs::Router;
/// use agentloop::state::SessionState;
///
/// let router = |state: &SessionState| {
///     if state.is_terminal() { "END".to_string() } else { "worker".to_string() }
/// };
/// let state = SessionState::new("criteria");
/// assert_eq!(router.route(&state), "worker");
/// ```
pub trait Router: Send + Sync {
    /// Produce the outcome label for the current state.
    fn route(&self, state: &SessionState) -> String;
}

impl<F> Router for F
where
    F: Fn(&SessionState) -> String + Send + Sync,
{
    fn route(&self, state: &SessionState) -> String {
        (self)(state)
    }
}

/// A conditional edge: router plus its finite label → target table.
#[derive(Clone)]
pub struct RouterEdge {
    router: Arc<dyn Router>,
    targets: FxHashMap<String, NodeKind>,
    default: Option<NodeKind>,
}

impl std::fmt::Debug for RouterEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterEdge")
            .field("targets", &self.targets)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

impl RouterEdge {
    pub fn new(router: Arc<dyn Router>, targets: FxHashMap<String, NodeKind>) -> Self {
        Self {
            router,
            targets,
            default: None,
        }
    }

    /// Target used when the router emits a label outside the table.
    #[must_use]
    pub fn with_default(mut self, default: NodeKind) -> Self {
        self.default = Some(default);
        self
    }

    /// Evaluate the router against the current state.
    #[must_use]
    pub fn label(&self, state: &SessionState) -> String {
        self.router.route(state)
    }

    /// Resolve a label through the table, falling back to the default.
    #[must_use]
    pub fn resolve(&self, label: &str) -> Option<&NodeKind> {
        self.targets.get(label).or(self.default.as_ref())
    }

    /// Every target this edge can route to (table entries plus default).
    pub fn targets(&self) -> impl Iterator<Item = (&str, &NodeKind)> {
        self.targets
            .iter()
            .map(|(label, target)| (label.as_str(), target))
            .chain(self.default.iter().map(|target| ("<default>", target)))
    }
}

/// The single outgoing edge of a node.
#[derive(Clone, Debug)]
pub enum Edge {
    /// Unconditional successor.
    To(NodeKind),
    /// Successor chosen by a router at run time.
    Routed(RouterEdge),
}
