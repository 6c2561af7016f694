//! Checkpoint persistence: trait, in-memory backend, and error types.
//!
//! A checkpoint is the persisted [`SessionState`] for one session,
//! overwritten on every completed step-run (most-recent-wins; the engine
//! keeps no history). Backends are keyed storage: concurrent `save`/`load`
//! for distinct session ids must not interfere, and no cross-session
//! locking is required.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use std::sync::RwLock;
use thiserror::Error;

use crate::state::SessionState;

/// Selects the persistence backend for an executor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckpointerType {
    /// Volatile in-process storage.
    InMemory,
    /// Durable SQLite storage via sqlx.
    #[cfg(feature = "sqlite")]
    Sqlite,
}

/// The persisted record for one session.
#[derive(Clone, Debug, PartialEq)]
pub struct Checkpoint {
    /// Owning session.
    pub session_id: String,
    /// Cumulative node executions across the session's step-runs.
    pub step: u64,
    /// Full session state at the time of the save.
    pub state: SessionState,
    /// When this checkpoint was written.
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    #[must_use]
    pub fn new(session_id: impl Into<String>, step: u64, state: SessionState) -> Self {
        Self {
            session_id: session_id.into(),
            step,
            state,
            created_at: Utc::now(),
        }
    }
}

/// Errors raised by checkpoint backends.
#[derive(Debug, Error, Diagnostic)]
pub enum CheckpointerError {
    /// The storage backend failed.
    #[error("checkpoint backend error: {message}")]
    #[diagnostic(
        code(agentloop::checkpointer::backend),
        help("Check backend connectivity and storage permissions.")
    )]
    Backend { message: String },

    /// A checkpoint payload could not be (de)serialized.
    #[error("checkpoint serialization failed: {source}")]
    #[diagnostic(code(agentloop::checkpointer::serde))]
    Serialization {
        #[source]
        source: serde_json::Error,
    },
}

impl CheckpointerError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckpointerError>;

/// Pluggable persistence for session checkpoints.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Persist a checkpoint, replacing any previous record for the session.
    async fn save(&self, checkpoint: Checkpoint) -> Result<()>;

    /// Load the current checkpoint for a session, if one exists.
    async fn load_latest(&self, session_id: &str) -> Result<Option<Checkpoint>>;

    /// Drop a session's checkpoint. Unknown sessions are not an error.
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Ids of every session with a stored checkpoint.
    async fn list_sessions(&self) -> Result<Vec<String>>;
}

/// Volatile in-process checkpointer for tests and development.
///
/// One record per session id; `save` overwrites. The map is guarded by a
/// `RwLock` with short critical sections, so concurrent access for distinct
/// sessions does not interfere.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointer {
    store: RwLock<FxHashMap<String, Checkpoint>>,
}

impl InMemoryCheckpointer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    async fn save(&self, checkpoint: Checkpoint) -> Result<()> {
        let mut store = self
            .store
            .write()
            .map_err(|_| CheckpointerError::backend("checkpoint store lock poisoned"))?;
        store.insert(checkpoint.session_id.clone(), checkpoint);
        Ok(())
    }

    async fn load_latest(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        let store = self
            .store
            .read()
            .map_err(|_| CheckpointerError::backend("checkpoint store lock poisoned"))?;
        Ok(store.get(session_id).cloned())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let mut store = self
            .store
            .write()
            .map_err(|_| CheckpointerError::backend("checkpoint store lock poisoned"))?;
        store.remove(session_id);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        let store = self
            .store
            .read()
            .map_err(|_| CheckpointerError::backend("checkpoint store lock poisoned"))?;
        Ok(store.keys().cloned().collect())
    }
}
