//! # Agentloop: Graph-driven Resumable Agent Loop
//!
//! Agentloop is a small engine for running a bounded propose → act → evaluate
//! loop over a directed graph of named steps, with conversation state
//! checkpointed per session so execution resumes exactly where it left off
//! across independent invocations.
//!
//! ## Core Concepts
//!
//! - **Messages**: Role-tagged conversation primitives, optionally carrying
//!   tool-call requests and results
//! - **SessionState**: The per-session record threaded through every step
//! - **Nodes**: Async units of work that consume state and return deltas
//! - **Routers**: Label-producing functions that pick the next node from state
//! - **Workflow**: Immutable compiled topology with a tagged-variant edge table
//! - **Executor**: Drives the graph under a hard step ceiling and persists a
//!   checkpoint per completed step-run
//!
//! ## Quick Start
//!
//! ```
//! use agentloop::message::Message;
//! use agentloop::state::{SessionState, StateDelta};
//!
//! let mut state = SessionState::new("The answer should be clear and accurate");
//! state.push_message(Message::user("What is 2+2?"));
//!
//! let delta = StateDelta::new().with_messages(vec![Message::assistant("4")]);
//! state.apply(delta);
//!
//! assert_eq!(state.messages.len(), 2);
//! assert!(!state.is_terminal());
//! ```
//!
//! ## Module Guide
//!
//! - [`message`] - Message types and construction utilities
//! - [`state`] - Session state and partial-update deltas
//! - [`node`] - Node trait and execution primitives
//! - [`graphs`] - Workflow graph definition and compilation
//! - [`workflow`] - Compiled, immutable graph topology
//! - [`runtimes`] - Executor, checkpointing, runtime configuration
//! - [`collaborators`] - Generative-model collaborator boundary
//! - [`tools`] - Tool registry and ordered tool execution
//! - [`nodes`] - Prebuilt worker / tools / evaluator nodes and routers
//! - [`session`] - High-level assistant session wrapper

pub mod collaborators;
pub mod graphs;
pub mod message;
pub mod node;
pub mod nodes;
pub mod runtimes;
pub mod session;
pub mod state;
pub mod telemetry;
pub mod tools;
pub mod types;
pub mod utils;
pub mod workflow;
