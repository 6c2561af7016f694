//! High-level assistant session wrapper.
//!
//! [`Assistant`] owns the immutable collaborator bundle (one chat client
//! and one tool registry), wires the default worker/tools/evaluator
//! workflow, and exposes the caller-facing surface: create a session,
//! submit a message, reset, and teardown.
//!
//! Resource ownership: stateful tool handles live in the registry, not in
//! session state. [`Assistant::reset`] and [`Assistant::teardown`] release
//! them explicitly, and both are safe to call from a different task than
//! the one that created the tools (teardown is often driven by UI
//! lifecycle events outside the step loop).

use std::sync::Arc;

use crate::collaborators::ChatClient;
use crate::graphs::{GraphBuilder, GraphConfigError, HALT};
use crate::message::Message;
use crate::nodes::{
    EVALUATOR, EvaluatorNode, EvaluatorRouter, TOOLS, ToolExecNode, WORKER, WorkerNode,
    WorkerRouter,
};
use crate::runtimes::{Executor, ExecutorError, RuntimeConfig, SessionId, Turn};
use crate::tools::ToolRegistry;
use crate::types::NodeKind;
use crate::workflow::Workflow;

/// Builds the default propose → act → evaluate workflow over the given
/// collaborators.
///
/// Topology: `Start → worker`; after `worker` a router picks `tools` or
/// `evaluator`; `tools` loops unconditionally back to `worker`; after
/// `evaluator` a router loops to `worker` or halts.
pub fn build_workflow(
    chat: Arc<dyn ChatClient>,
    tools: Arc<ToolRegistry>,
) -> Result<Workflow, GraphConfigError> {
    GraphBuilder::new()
        .add_node(WORKER.into(), WorkerNode::new(chat.clone()))
        .add_node(TOOLS.into(), ToolExecNode::new(tools))
        .add_node(EVALUATOR.into(), EvaluatorNode::new(chat))
        .add_edge(NodeKind::Start, WORKER.into())
        .add_router(
            WORKER.into(),
            WorkerRouter,
            [(TOOLS, NodeKind::from(TOOLS)), (EVALUATOR, NodeKind::from(EVALUATOR))],
        )
        .add_edge(TOOLS.into(), WORKER.into())
        .add_router(
            EVALUATOR.into(),
            EvaluatorRouter,
            [(WORKER, NodeKind::from(WORKER)), (HALT, NodeKind::End)],
        )
        .compile()
}

/// A resumable assistant: the collaborator bundle plus the executor that
/// drives the default loop over checkpointed sessions.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use agentloop::collaborators::ChatClient;
/// use agentloop::runtimes::RuntimeConfig;
/// use agentloop::session::Assistant;
/// use agentloop::tools::ToolRegistry;
///
/// # async fn example(chat: Arc<dyn ChatClient>) -> Result<(), Box<dyn std::error::Error>> {
/// let assistant = Assistant::new(chat, Arc::new(ToolRegistry::new()), RuntimeConfig::default()).await?;
/// let session = assistant.new_session();
///
/// let turn = assistant
///     .submit(session.as_str(), "What is 2+2?", Some("numeric answer"))
///     .await?;
/// println!("{}", turn.reply.content);
///
/// assistant.teardown().await;
/// # Ok(())
/// # }
/// ```
pub struct Assistant {
    executor: Executor,
    tools: Arc<ToolRegistry>,
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("executor", &self.executor)
            .field("tools", &self.tools)
            .finish()
    }
}

impl Assistant {
    /// Wires the default workflow over the collaborators and constructs the
    /// executor per `config`.
    pub async fn new(
        chat: Arc<dyn ChatClient>,
        tools: Arc<ToolRegistry>,
        config: RuntimeConfig,
    ) -> Result<Self, GraphConfigError> {
        let workflow = build_workflow(chat, tools.clone())?;
        let executor = Executor::from_config(workflow, config).await;
        Ok(Self { executor, tools })
    }

    /// Mints a fresh session id.
    #[must_use]
    pub fn new_session(&self) -> SessionId {
        SessionId::generate()
    }

    /// Submit a user message to a session and drive the loop to its next
    /// halt. Returns the `(user, reply, evaluation)` triple.
    pub async fn submit(
        &self,
        session_id: &str,
        message: &str,
        success_criteria: Option<&str>,
    ) -> Result<Turn, ExecutorError> {
        self.executor
            .run_step(session_id, message, success_criteria)
            .await
    }

    /// Append a turn's triple to a caller-held history.
    pub fn extend_history(history: &mut Vec<Message>, turn: Turn) {
        history.extend(turn.into_messages());
    }

    /// Abandon a session: drop its checkpoint and release any tool
    /// resources, then mint the replacement session id.
    ///
    /// Resources are released before the new session starts, independent of
    /// the abandoned session's state.
    pub async fn reset(&self, session_id: &str) -> Result<SessionId, ExecutorError> {
        self.executor.reset(session_id).await?;
        self.tools.release_all().await;
        Ok(SessionId::generate())
    }

    /// Release every tool's long-lived resources.
    ///
    /// Safe to call from a different scheduling context than setup; called
    /// by UI lifecycle hooks when the surrounding application shuts down.
    pub async fn teardown(&self) {
        self.tools.release_all().await;
    }

    /// The executor driving this assistant's sessions.
    #[must_use]
    pub fn executor(&self) -> &Executor {
        &self.executor
    }
}
