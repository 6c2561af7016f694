//! Node execution primitives for the agentloop workflow engine.
//!
//! A [`Node`] is a single named step: it consumes the current
//! [`SessionState`](crate::state::SessionState) and returns a
//! [`StateDelta`](crate::state::StateDelta) that the executor merges.
//! Nodes are stateless across sessions; any model or tool handle a node
//! needs is injected at construction, never stored as ambient shared state.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::collaborators::ModelError;
use crate::state::{SessionState, StateDelta};
use crate::types::NodeKind;

/// Core trait defining executable workflow nodes.
///
/// Nodes must be referentially transparent with respect to session state:
/// given the same input state they compute the same delta, with collaborator
/// nondeterminism (model replies, tool output) treated as an accepted
/// external effect.
///
/// # Error Handling
///
/// Returning `Err(NodeError)` aborts the current step-run; the session is
/// left at its last committed checkpoint so a retried step re-enters
/// cleanly. Recoverable failures (e.g. a single tool call failing) belong
/// in-band in the transcript instead, as tool-result messages with an error
/// payload.
#[async_trait]
pub trait Node: Send + Sync {
    /// Execute this node against the given state.
    async fn run(&self, state: &SessionState, ctx: &NodeContext) -> Result<StateDelta, NodeError>;
}

/// Execution context passed to nodes during a step-run.
#[derive(Clone, Debug)]
pub struct NodeContext {
    /// The session this step-run belongs to.
    pub session_id: String,
    /// Identity of the node being executed.
    pub node: NodeKind,
    /// 1-based execution counter within the current step-run.
    pub step: u64,
}

/// Errors that can occur during node execution.
///
/// `NodeError` represents fatal errors that halt the current step-run.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    /// Generative-model collaborator call failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),

    /// Expected input data is missing from the session state.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(agentloop::node::missing_input),
        help("Check that the previous node produced the required data.")
    )]
    MissingInput { what: &'static str },

    /// JSON serialization/deserialization error.
    #[error(transparent)]
    #[diagnostic(code(agentloop::node::serde_json))]
    Serde(#[from] serde_json::Error),
}
