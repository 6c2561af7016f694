//! Tool-execution node: act on the worker's pending requests.

use async_trait::async_trait;
use std::sync::Arc;

use crate::node::{Node, NodeContext, NodeError};
use crate::state::{SessionState, StateDelta};
use crate::tools::ToolRegistry;

/// Executes every pending tool call on the last message and appends one
/// tool-result message per call, preserving request order.
///
/// Failures (unknown tool name, failed invocation) are recorded in-band as
/// error-payload results; the worker sees them on its next cycle. The graph
/// gives this node a fixed edge back to the worker.
pub struct ToolExecNode {
    registry: Arc<ToolRegistry>,
}

impl ToolExecNode {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Node for ToolExecNode {
    async fn run(&self, state: &SessionState, ctx: &NodeContext) -> Result<StateDelta, NodeError> {
        let calls = state
            .last_message()
            .map(|m| m.pending_tool_calls())
            .unwrap_or_default();
        if calls.is_empty() {
            return Err(NodeError::MissingInput {
                what: "pending tool calls on the last message",
            });
        }

        tracing::debug!(session = %ctx.session_id, calls = calls.len(), "executing tool calls");
        let results = self.registry.execute_all(calls).await;
        Ok(StateDelta::new().with_messages(results))
    }
}
