//! Tool registry and ordered tool execution.
//!
//! Tools are the "act" half of the loop: the worker requests invocations,
//! the tools node resolves each request against the [`ToolRegistry`] by name
//! and appends one tool-result message per call, preserving request order.
//!
//! Tool failures are deliberately in-band: an unknown name or a failed
//! invocation becomes an error-payload tool-result message rather than a
//! process fault, so the worker sees the failure on its next cycle and can
//! adapt or report it.
//!
//! Stateful handles a tool holds (browser sessions, subprocesses) are owned
//! here, not by session state; [`ToolRegistry::release_all`] must be safe to
//! call from a different task than the one that created the tools.

use async_trait::async_trait;
use futures_util::future::join_all;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;

use crate::message::{Message, ToolCall};

/// Descriptor advertised to the model for one tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Registry name; the model addresses the tool by this.
    pub name: String,
    /// What the tool does, phrased for the model.
    pub description: String,
    /// JSON Schema of the accepted arguments.
    pub parameters: Value,
}

impl ToolSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Descriptor for the model-facing tool listing.
    fn spec(&self) -> ToolSpec;

    /// Execute the tool with the given JSON arguments.
    async fn invoke(&self, arguments: Value) -> Result<Value, ToolError>;

    /// Release any long-lived resources this tool holds.
    ///
    /// Called on session reset and teardown, possibly from a different
    /// scheduling context than the one that created the tool.
    async fn release(&self) {}
}

/// Failures of a single tool invocation.
///
/// These are recoverable conversation content: the tools node records them
/// as error-payload result messages instead of propagating them.
#[derive(Debug, Error, Diagnostic)]
pub enum ToolError {
    /// The requested name is not in the registry.
    #[error("unknown tool: {name}")]
    #[diagnostic(
        code(agentloop::tools::unknown),
        help("The worker sees this as an in-band error result and may adapt.")
    )]
    UnknownTool { name: String },

    /// The arguments did not match the tool's schema.
    #[error("invalid arguments for tool {name}: {message}")]
    #[diagnostic(code(agentloop::tools::invalid_arguments))]
    InvalidArguments { name: String, message: String },

    /// The tool ran and failed.
    #[error("tool {name} failed: {message}")]
    #[diagnostic(code(agentloop::tools::invocation))]
    Invocation { name: String, message: String },
}

impl ToolError {
    pub fn invocation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invocation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_arguments(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Name-keyed collection of tools shared by one assistant instance.
#[derive(Default)]
pub struct ToolRegistry {
    tools: FxHashMap<String, Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its spec name. Last registration wins.
    #[must_use]
    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.register(tool);
        self
    }

    /// Register a tool under its spec name. Last registration wins.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let tool: Arc<dyn Tool> = Arc::new(tool);
        self.tools.insert(tool.spec().name, tool);
    }

    /// Descriptors for every registered tool.
    #[must_use]
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|t| t.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Look up a tool by registry name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute every call, returning one result message per call in request
    /// order.
    ///
    /// Independent calls run concurrently; `join_all` preserves the input
    /// order of the results regardless of completion order.
    pub async fn execute_all(&self, calls: &[ToolCall]) -> Vec<Message> {
        join_all(calls.iter().map(|call| self.execute_one(call))).await
    }

    /// Execute a single call, folding any failure into an in-band error
    /// payload on the result message.
    async fn execute_one(&self, call: &ToolCall) -> Message {
        let outcome = match self.tools.get(&call.name) {
            Some(tool) => tool.invoke(call.arguments.clone()).await,
            None => Err(ToolError::UnknownTool {
                name: call.name.clone(),
            }),
        };
        let payload = match outcome {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(tool = %call.name, call_id = %call.id, error = %err, "tool call failed");
                json!({ "error": err.to_string() })
            }
        };
        Message::tool(payload.to_string(), call.id.clone())
    }

    /// Release every tool's long-lived resources.
    pub async fn release_all(&self) {
        for tool in self.tools.values() {
            tool.release().await;
        }
    }
}
