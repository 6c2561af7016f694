//! Runtime infrastructure: the executor, checkpointing, and configuration.
//!
//! The runtime layer drives a compiled [`Workflow`](crate::workflow::Workflow)
//! one step-run at a time, persisting the resulting
//! [`SessionState`](crate::state::SessionState) through a pluggable
//! [`Checkpointer`] so execution resumes exactly where it left off across
//! independent invocations.
//!
//! # Persistence Backends
//!
//! - [`InMemoryCheckpointer`] - volatile storage for tests and development
//! - [`SqliteCheckpointer`] - durable SQLite-backed persistence (feature
//!   `sqlite`, default-on)
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use agentloop::runtimes::{Executor, RuntimeConfig};
//! # use agentloop::workflow::Workflow;
//! # async fn example(workflow: Workflow) -> Result<(), Box<dyn std::error::Error>> {
//! let executor = Executor::from_config(workflow, RuntimeConfig::default()).await;
//! let turn = executor
//!     .run_step("session-1", "What is 2+2?", Some("numeric answer"))
//!     .await?;
//! println!("{}", turn.reply.content);
//! # Ok(())
//! # }
//! ```

pub mod checkpointer;
#[cfg(feature = "sqlite")]
pub mod checkpointer_sqlite;
pub mod executor;
pub mod persistence;
pub mod runtime_config;
pub mod types;

pub use checkpointer::{
    Checkpoint, Checkpointer, CheckpointerError, CheckpointerType, InMemoryCheckpointer,
};
#[cfg(feature = "sqlite")]
pub use checkpointer_sqlite::SqliteCheckpointer;
pub use executor::{Executor, ExecutorError, Turn};
pub use persistence::{PersistedCheckpoint, PersistenceError};
pub use runtime_config::{DEFAULT_STEP_LIMIT, RuntimeConfig};
pub use types::{SessionId, StepNumber};
