//! End-to-end walkthrough of the default propose → act → evaluate loop,
//! driven by an offline rule-based model so it runs without credentials.
//!
//! Run with: `cargo run --example quickstart`

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use agentloop::collaborators::{ChatClient, ModelError};
use agentloop::message::{Message, Role, ToolCall};
use agentloop::runtimes::RuntimeConfig;
use agentloop::session::Assistant;
use agentloop::tools::{Tool, ToolError, ToolRegistry, ToolSpec};

/// Rule-based stand-in for a hosted model: first asks for the word-count
/// tool, then answers using the tool result it sees in the transcript.
struct CannedChat {
    calls: AtomicUsize,
}

#[async_trait]
impl ChatClient for CannedChat {
    async fn invoke(&self, messages: &[Message]) -> Result<Message, ModelError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            let question = messages
                .iter()
                .rev()
                .find(|m| m.has_role(Role::User))
                .map(|m| m.content.clone())
                .unwrap_or_default();
            return Ok(Message::assistant_with_tool_calls(
                "",
                vec![ToolCall::new(
                    "call-1",
                    "word_count",
                    json!({ "text": question }),
                )],
            ));
        }
        let tool_result = messages
            .iter()
            .rev()
            .find(|m| m.has_role(Role::Tool))
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(Message::assistant(format!(
            "Your request contained {tool_result} words."
        )))
    }

    async fn invoke_structured(
        &self,
        _messages: &[Message],
        _schema: &Value,
    ) -> Result<Value, ModelError> {
        Ok(json!({
            "feedback": "The reply states the word count plainly.",
            "criteria_met": true,
            "user_input_needed": false,
        }))
    }
}

struct WordCount;

#[async_trait]
impl Tool for WordCount {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "word_count",
            "Count the words in a piece of text",
            json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"]
            }),
        )
    }

    async fn invoke(&self, arguments: Value) -> Result<Value, ToolError> {
        let text = arguments
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::invalid_arguments("word_count", "expected `text`"))?;
        Ok(json!(text.split_whitespace().count()))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    agentloop::telemetry::init();

    let chat = Arc::new(CannedChat {
        calls: AtomicUsize::new(0),
    });
    let tools = Arc::new(ToolRegistry::new().with_tool(WordCount));
    let assistant = Assistant::new(chat, tools, RuntimeConfig::default()).await?;

    let session = assistant.new_session();
    tracing::info!(%session, "session created");

    let turn = assistant
        .submit(
            session.as_str(),
            "How many words is this exact question?",
            Some("A word count is stated"),
        )
        .await?;

    println!("user:      {}", turn.user.content);
    println!("assistant: {}", turn.reply.content);
    println!("evaluator: {}", turn.evaluation.content);

    assistant.teardown().await;
    Ok(())
}
