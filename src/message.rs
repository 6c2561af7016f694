//! Conversation primitives: role-tagged messages and tool calls.
//!
//! Messages are the single source of truth for "what happened" in a session.
//! An assistant message may carry pending [`ToolCall`] requests; each executed
//! call is answered by a tool-role message correlated via `tool_call_id`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The originator of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End-user input.
    User,
    /// Model output, including tool-call requests.
    Assistant,
    /// Instructional preamble; at most one per session.
    System,
    /// Result of an executed tool call.
    Tool,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool invocation requested by an assistant message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id echoed back on the matching tool-result message.
    pub id: String,
    /// Registry name of the tool to invoke.
    pub name: String,
    /// JSON arguments as produced by the model.
    pub arguments: Value,
}

impl ToolCall {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// A message in a session transcript.
///
/// # Examples
///
/// ```
/// use agentloop::message::{Message, Role};
///
/// let user_msg = Message::user("What's the weather like?");
/// let assistant_msg = Message::assistant("It's sunny today!");
/// let system_msg = Message::system("You are a helpful assistant.");
///
/// assert!(user_msg.has_role(Role::User));
/// assert!(!user_msg.has_role(Role::Assistant));
/// assert!(assistant_msg.pending_tool_calls().is_empty());
/// ```
///
/// Messages serialize to JSON for checkpoint payloads:
///
/// ```
/// use agentloop::message::Message;
///
/// let msg = Message::user("test");
/// let json = serde_json::to_string(&msg).unwrap();
/// let parsed: Message = serde_json::from_str(&json).unwrap();
/// assert_eq!(msg, parsed);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who produced this message.
    pub role: Role,
    /// The text content of the message.
    pub content: String,
    /// Tool invocations requested by an assistant reply; empty otherwise.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Set only on tool-result messages: the id of the call being answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Creates a new message with the specified role and content.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message with no tool calls.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates an assistant message carrying tool-call requests.
    #[must_use]
    pub fn assistant_with_tool_calls(
        content: impl Into<String>,
        tool_calls: Vec<ToolCall>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a tool-result message answering the call with `tool_call_id`.
    #[must_use]
    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Returns true if this message has the specified role.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    /// Tool-call requests that have not yet been answered in-message.
    ///
    /// Only assistant messages carry requests; for every other role this is
    /// the empty slice.
    #[must_use]
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        if self.role == Role::Assistant {
            &self.tool_calls
        } else {
            &[]
        }
    }
}
