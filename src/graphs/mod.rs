//! Graph definition and compilation.
//!
//! [`GraphBuilder`] constructs a workflow from nodes and a tagged-variant
//! edge table: each node maps to either a fixed successor or a router whose
//! finite label set is resolved through an explicit lookup. `compile()`
//! validates the topology and produces an immutable
//! [`Workflow`](crate::workflow::Workflow).
//!
//! # Quick Start
//!
//! ```
//! use agentloop::graphs::GraphBuilder;
//! use agentloop::node::{Node, NodeContext, NodeError};
//! use agentloop::state::{SessionState, StateDelta};
//! use agentloop::types::NodeKind;
//! use async_trait::async_trait;
//!
//! struct NoopNode;
//!
//! #[async_trait]
//! impl Node for NoopNode {
//!     async fn run(&self, _: &SessionState, _: &NodeContext) -> Result<StateDelta, NodeError> {
//!         Ok(StateDelta::new())
//!     }
//! }
//!
//! // Start (virtual) -> step -> End (virtual)
//! let workflow = GraphBuilder::new()
//!     .add_node("step".into(), NoopNode)
//!     .add_edge(NodeKind::Start, "step".into())
//!     .add_edge("step".into(), NodeKind::End)
//!     .compile()
//!     .expect("valid graph");
//!
//! assert_eq!(workflow.entry(), &NodeKind::from("step"));
//! ```
//!
//! # Conditional Routing
//!
//! ```
//! use agentloop::graphs::{GraphBuilder, HALT};
//! use agentloop::state::SessionState;
//! use agentloop::types::NodeKind;
//! # use agentloop::node::{Node, NodeContext, NodeError};
//! # use agentloop::state::StateDelta;
//! # use async_trait::async_trait;
//! # struct NoopNode;
//! # #[async_trait]
//! # impl Node for NoopNode {
//! #     async fn run(&self, _: &SessionState, _: &NodeContext) -> Result<StateDelta, NodeError> {
//! #         Ok(StateDelta::new())
//! #     }
//! # }
//!
//! let workflow = GraphBuilder::new()
//!     .add_node("check".into(), NoopNode)
//!     .add_edge(NodeKind::Start, "check".into())
//!     .add_router(
//!         "check".into(),
//!         |state: &SessionState| {
//!             if state.is_terminal() { HALT.to_string() } else { "check".to_string() }
//!         },
//!         [("check", NodeKind::from("check")), (HALT, NodeKind::End)],
//!     )
//!     .compile()
//!     .expect("valid graph");
//! # let _ = workflow;
//! ```

mod builder;
mod compilation;
mod edges;

pub use builder::GraphBuilder;
pub use compilation::GraphConfigError;
pub use edges::{Edge, HALT, Router, RouterEdge};
