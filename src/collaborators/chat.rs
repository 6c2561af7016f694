//! Generative-model collaborator interface.

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::message::Message;

/// Boundary to a generative model.
///
/// Two call shapes are required by the engine: free-form completion for the
/// worker node and schema-constrained structured output for the evaluator.
/// Implementations must surface transport and parse failures as
/// [`ModelError`] values, never as plain strings slipped into the
/// transcript.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Produce the next assistant message for the given transcript.
    ///
    /// The reply may carry zero or more tool-call requests.
    async fn invoke(&self, messages: &[Message]) -> Result<Message, ModelError>;

    /// Produce a JSON value conforming to `schema` for the given transcript.
    ///
    /// Callers decode the value into their typed shape; a decode failure is
    /// a [`ModelError::StructuredDecode`], not a default.
    async fn invoke_structured(
        &self,
        messages: &[Message],
        schema: &Value,
    ) -> Result<Value, ModelError>;
}

/// Failures crossing the generative-model boundary.
#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    /// The transport failed: timeout, connection error, provider outage.
    #[error("model transport failure: {message}")]
    #[diagnostic(
        code(agentloop::model::transport),
        help("Retry the step; the session checkpoint was left at its last good state.")
    )]
    Transport { message: String },

    /// The provider answered, but the reply is unusable.
    #[error("model returned a malformed reply: {message}")]
    #[diagnostic(code(agentloop::model::malformed_reply))]
    MalformedReply { message: String },

    /// Structured output did not match the requested schema.
    #[error("structured output did not match the requested schema: {source}")]
    #[diagnostic(
        code(agentloop::model::structured_decode),
        help("The judgement must carry feedback, criteria_met, and user_input_needed.")
    )]
    StructuredDecode {
        #[source]
        source: serde_json::Error,
    },
}

impl ModelError {
    /// Convenience constructor for transport-level failures.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Convenience constructor for unusable replies.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedReply {
            message: message.into(),
        }
    }
}
