//! Worker node: propose the next action.

use async_trait::async_trait;
use std::sync::Arc;

use crate::collaborators::ChatClient;
use crate::graphs::Router;
use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError};
use crate::state::{SessionState, StateDelta};

use super::{EVALUATOR, TOOLS};

/// Decides the next action: request tool invocations or produce a candidate
/// final answer.
///
/// On the first execution in a session the worker synthesizes the single
/// system message from the success criteria (or, when evaluator feedback is
/// present, from a retry framing) and prepends it. It then invokes the
/// model with the full message sequence and appends the reply, which may
/// carry tool-call requests.
///
/// Never mutates the criteria, the feedback, or the terminal flags.
pub struct WorkerNode {
    chat: Arc<dyn ChatClient>,
}

impl WorkerNode {
    pub fn new(chat: Arc<dyn ChatClient>) -> Self {
        Self { chat }
    }

    fn system_prompt(state: &SessionState) -> String {
        match &state.feedback {
            Some(feedback) => format!(
                "Your previous reply was judged insufficient and rejected. \
                 The evaluator's feedback was:\n{feedback}\n\
                 Continue the assignment using this feedback. Check whether the \
                 success criteria are now met or whether the user must be asked \
                 for clarification."
            ),
            None => format!(
                "You are an assistant that completes tasks, using tools when \
                 they help. Keep working until the success criteria are met or \
                 you need clarification from the user.\n\
                 Success criteria:\n{}\n\
                 Reply with either a question for the user or your final \
                 answer. A question must be clearly stated as one; a final \
                 answer must not be a question.",
                state.success_criteria
            ),
        }
    }
}

#[async_trait]
impl Node for WorkerNode {
    async fn run(&self, state: &SessionState, ctx: &NodeContext) -> Result<StateDelta, NodeError> {
        let mut delta = StateDelta::new();

        let messages: Vec<Message> = if state.system_message().is_none() {
            let system = Message::system(Self::system_prompt(state));
            delta = delta.with_system(system.clone());
            std::iter::once(system)
                .chain(state.messages.iter().cloned())
                .collect()
        } else {
            state.messages.clone()
        };

        let reply = self.chat.invoke(&messages).await?;
        tracing::debug!(
            session = %ctx.session_id,
            tool_calls = reply.pending_tool_calls().len(),
            "worker reply received"
        );

        Ok(delta.with_messages(vec![reply]))
    }
}

/// Routes the worker's reply: any pending tool call wins over its
/// natural-language content.
pub struct WorkerRouter;

impl Router for WorkerRouter {
    fn route(&self, state: &SessionState) -> String {
        match state.last_message() {
            Some(message) if !message.pending_tool_calls().is_empty() => TOOLS.to_string(),
            _ => EVALUATOR.to_string(),
        }
    }
}
