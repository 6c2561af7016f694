/*!
Persistence primitives for serializing checkpoints (used by the SQLite
checkpointer and any future durable backends).

Design goals:
- Explicit serde-friendly structs decoupled from in-memory representations.
- Conversion logic localized (From / TryFrom impls) so checkpointer code
  stays lean and declarative.

This module intentionally performs NO I/O; it is pure data transformation
and (de)serialization glue.
*/

use chrono::Utc;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtimes::checkpointer::Checkpoint;
use crate::state::SessionState;

/// Serialization errors for persistence models.
#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("JSON serialization/deserialization failed: {source}")]
    #[diagnostic(
        code(agentloop::persistence::serde),
        help("Ensure the JSON structure matches the PersistedCheckpoint shape.")
    )]
    Serde {
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Full persisted shape of one checkpoint.
///
/// `created_at` is kept as an RFC 3339 string to keep `chrono::DateTime`
/// out of the serialized shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedCheckpoint {
    pub session_id: String,
    pub step: u64,
    pub state: SessionState,
    pub created_at: String,
}

impl PersistedCheckpoint {
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|source| PersistenceError::Serde { source })
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|source| PersistenceError::Serde { source })
    }
}

impl From<&Checkpoint> for PersistedCheckpoint {
    fn from(cp: &Checkpoint) -> Self {
        PersistedCheckpoint {
            session_id: cp.session_id.clone(),
            step: cp.step,
            state: cp.state.clone(),
            created_at: cp.created_at.to_rfc3339(),
        }
    }
}

impl From<PersistedCheckpoint> for Checkpoint {
    fn from(p: PersistedCheckpoint) -> Self {
        let created_at = chrono::DateTime::parse_from_rfc3339(&p.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        Checkpoint {
            session_id: p.session_id,
            step: p.step,
            state: p.state,
            created_at,
        }
    }
}
