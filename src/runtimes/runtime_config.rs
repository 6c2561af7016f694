//! Runtime configuration for executors.

use super::checkpointer::CheckpointerType;

/// Default ceiling on node executions per step-run (eight
/// worker/tools/evaluator cycles).
pub const DEFAULT_STEP_LIMIT: usize = 24;

/// Execution settings for an [`Executor`](super::Executor).
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Persistence backend to construct; `None` means in-memory.
    pub checkpointer: Option<CheckpointerType>,
    /// Database file for the SQLite backend, unless overridden by the
    /// `AGENTLOOP_SQLITE_URL` environment variable.
    pub sqlite_db_name: Option<String>,
    /// Hard ceiling on node executions per step-run.
    pub step_limit: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            checkpointer: Some(CheckpointerType::InMemory),
            sqlite_db_name: Self::resolve_sqlite_db_name(None),
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }
}

impl RuntimeConfig {
    fn resolve_sqlite_db_name(provided: Option<String>) -> Option<String> {
        if let Some(name) = provided {
            return Some(name);
        }
        dotenvy::dotenv().ok();
        Some(std::env::var("SQLITE_DB_NAME").unwrap_or_else(|_| "agentloop.db".to_string()))
    }

    pub fn new(checkpointer: Option<CheckpointerType>, sqlite_db_name: Option<String>) -> Self {
        Self {
            checkpointer,
            sqlite_db_name: Self::resolve_sqlite_db_name(sqlite_db_name),
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    /// Override the per-step-run node execution ceiling.
    #[must_use]
    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }
}
