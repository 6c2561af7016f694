//! Scripted collaborators and probe tools.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use agentloop::collaborators::{ChatClient, ModelError};
use agentloop::message::{Message, ToolCall};
use agentloop::node::{Node, NodeContext, NodeError};
use agentloop::state::{SessionState, StateDelta};
use agentloop::tools::{Tool, ToolError, ToolSpec};

/// Build the JSON value a scripted evaluator call returns.
pub fn verdict_value(feedback: &str, criteria_met: bool, user_input_needed: bool) -> Value {
    json!({
        "feedback": feedback,
        "criteria_met": criteria_met,
        "user_input_needed": user_input_needed,
    })
}

/// An assistant reply that requests a single tool call.
pub fn assistant_tool_call(id: &str, name: &str, arguments: Value) -> Message {
    Message::assistant_with_tool_calls("", vec![ToolCall::new(id, name, arguments)])
}

/// Chat client that replays queued replies and verdicts in order.
///
/// An exhausted script surfaces as a transport error so a test that
/// under-provisions its script fails loudly instead of hanging.
#[derive(Default)]
pub struct ScriptedChat {
    replies: Mutex<VecDeque<Result<Message, String>>>,
    verdicts: Mutex<VecDeque<Value>>,
}

impl ScriptedChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, message: Message) {
        self.replies.lock().unwrap().push_back(Ok(message));
    }

    pub fn push_failure(&self, message: &str) {
        self.replies.lock().unwrap().push_back(Err(message.to_string()));
    }

    pub fn push_verdict(&self, feedback: &str, criteria_met: bool, user_input_needed: bool) {
        self.push_raw_verdict(verdict_value(feedback, criteria_met, user_input_needed));
    }

    /// Queue an arbitrary structured-output value, malformed shapes included.
    pub fn push_raw_verdict(&self, value: Value) {
        self.verdicts.lock().unwrap().push_back(value);
    }
}

#[async_trait]
impl ChatClient for ScriptedChat {
    async fn invoke(&self, _messages: &[Message]) -> Result<Message, ModelError> {
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(message)) => Ok(message),
            Some(Err(message)) => Err(ModelError::transport(message)),
            None => Err(ModelError::transport("reply script exhausted")),
        }
    }

    async fn invoke_structured(
        &self,
        _messages: &[Message],
        _schema: &Value,
    ) -> Result<Value, ModelError> {
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ModelError::transport("verdict script exhausted"))
    }
}

/// Chat client whose first worker call parks on a gate, for overlap tests.
///
/// Every reply is "done" and every verdict is terminal, so a released call
/// drives straight to a halt.
pub struct BlockingChat {
    pub started: Arc<tokio::sync::Notify>,
    pub release: Arc<tokio::sync::Notify>,
}

impl BlockingChat {
    pub fn new() -> Self {
        Self {
            started: Arc::new(tokio::sync::Notify::new()),
            release: Arc::new(tokio::sync::Notify::new()),
        }
    }
}

#[async_trait]
impl ChatClient for BlockingChat {
    async fn invoke(&self, _messages: &[Message]) -> Result<Message, ModelError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(Message::assistant("done"))
    }

    async fn invoke_structured(
        &self,
        _messages: &[Message],
        _schema: &Value,
    ) -> Result<Value, ModelError> {
        Ok(verdict_value("fine", true, false))
    }
}

/// Tool that sleeps before answering, for result-ordering tests.
pub struct DelayedTool {
    pub name: String,
    pub delay: Duration,
    pub payload: Value,
}

#[async_trait]
impl Tool for DelayedTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(self.name.clone(), "test tool", json!({ "type": "object" }))
    }

    async fn invoke(&self, _arguments: Value) -> Result<Value, ToolError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.payload.clone())
    }
}

/// Tool that records whether its resources were released.
pub struct ReleaseProbe {
    pub name: String,
    pub released: Arc<AtomicBool>,
}

#[async_trait]
impl Tool for ReleaseProbe {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(self.name.clone(), "test tool", json!({ "type": "object" }))
    }

    async fn invoke(&self, _arguments: Value) -> Result<Value, ToolError> {
        Ok(Value::Null)
    }

    async fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Node that appends one assistant message and nothing else.
pub struct NoopNode;

#[async_trait]
impl Node for NoopNode {
    async fn run(&self, _: &SessionState, _: &NodeContext) -> Result<StateDelta, NodeError> {
        Ok(StateDelta::new().with_messages(vec![Message::assistant("noop")]))
    }
}
