//! Evaluator node: judge the worker's reply against the success criteria.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::collaborators::{ChatClient, ModelError};
use crate::graphs::{HALT, Router};
use crate::message::{Message, Role};
use crate::node::{Node, NodeContext, NodeError};
use crate::state::{SessionState, StateDelta};

use super::WORKER;

/// Structured judgement returned by the evaluator model call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Critique of the assistant's latest reply.
    pub feedback: String,
    /// Whether the success criteria have been met.
    pub criteria_met: bool,
    /// Whether the loop must stop for user input or clarification.
    pub user_input_needed: bool,
}

/// JSON Schema the evaluator call is constrained to.
#[must_use]
pub fn verdict_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "feedback": {
                "type": "string",
                "description": "Feedback on the assistant's response"
            },
            "criteria_met": {
                "type": "boolean",
                "description": "Whether the success criteria have been met"
            },
            "user_input_needed": {
                "type": "boolean",
                "description": "True if more input or clarification is needed from the user, or the assistant is stuck"
            }
        },
        "required": ["feedback", "criteria_met", "user_input_needed"]
    })
}

/// Judges whether the worker's latest non-tool reply satisfies the success
/// criteria.
///
/// Appends exactly one assistant-role summary message (for transcript
/// continuity) and overwrites `feedback`, `criteria_met`, and
/// `user_input_needed` from the judgement. This is the only node allowed to
/// write the terminal flags.
///
/// Malformed structured output is a hard [`ModelError::StructuredDecode`],
/// never silently defaulted.
pub struct EvaluatorNode {
    chat: Arc<dyn ChatClient>,
}

impl EvaluatorNode {
    pub fn new(chat: Arc<dyn ChatClient>) -> Self {
        Self { chat }
    }

    /// Render the user/assistant exchange for the judgement prompt. Tool
    /// traffic is collapsed into a placeholder, matching what the evaluator
    /// needs to see.
    fn render_transcript(messages: &[Message]) -> String {
        let mut transcript = String::from("Conversation history:\n\n");
        for message in messages {
            match message.role {
                Role::User => {
                    transcript.push_str("User: ");
                    transcript.push_str(&message.content);
                    transcript.push('\n');
                }
                Role::Assistant => {
                    transcript.push_str("Assistant: ");
                    if message.content.is_empty() {
                        transcript.push_str("[tool activity]");
                    } else {
                        transcript.push_str(&message.content);
                    }
                    transcript.push('\n');
                }
                Role::System | Role::Tool => {}
            }
        }
        transcript
    }

    fn judgement_request(state: &SessionState) -> Vec<Message> {
        let last_reply = state
            .last_message()
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let system = Message::system(
            "You are a strict, succinct evaluator deciding whether an \
             assistant completed a task. Assess the assistant's last \
             response and return feedback plus your decision on the \
             success criteria.",
        );
        let mut request = format!(
            "You are evaluating a conversation between a user and an \
             assistant.\n\n{}\nSuccess criteria for this assignment:\n{}\n\n\
             Final response from the assistant under evaluation:\n{}\n",
            Self::render_transcript(&state.messages),
            state.success_criteria,
            last_reply
        );
        if let Some(feedback) = &state.feedback {
            request.push_str(&format!(
                "\nOn the previous attempt you gave this feedback:\n{feedback}\n\
                 If the assistant repeats the same mistakes, consider answering \
                 that user input is required.\n"
            ));
        }
        vec![system, Message::user(request)]
    }
}

#[async_trait]
impl Node for EvaluatorNode {
    async fn run(&self, state: &SessionState, ctx: &NodeContext) -> Result<StateDelta, NodeError> {
        let request = Self::judgement_request(state);
        let raw = self
            .chat
            .invoke_structured(&request, &verdict_schema())
            .await?;
        let verdict: Verdict = serde_json::from_value(raw)
            .map_err(|source| ModelError::StructuredDecode { source })?;

        tracing::debug!(
            session = %ctx.session_id,
            criteria_met = verdict.criteria_met,
            user_input_needed = verdict.user_input_needed,
            "evaluator verdict"
        );

        let summary = Message::assistant(format!(
            "Evaluator feedback on this answer: {}",
            verdict.feedback
        ));
        Ok(StateDelta::new()
            .with_messages(vec![summary])
            .with_feedback(verdict.feedback)
            .with_criteria_met(verdict.criteria_met)
            .with_user_input_needed(verdict.user_input_needed))
    }
}

/// Halts when the session is terminal; otherwise sends the worker back for
/// another attempt carrying the fresh feedback.
pub struct EvaluatorRouter;

impl Router for EvaluatorRouter {
    fn route(&self, state: &SessionState) -> String {
        if state.is_terminal() {
            HALT.to_string()
        } else {
            WORKER.to_string()
        }
    }
}
