/*!
SQLite checkpointer.

Async implementation of the [`Checkpointer`] trait backed by sqlx. One row
per session holds the JSON-encoded [`PersistedCheckpoint`]; `save` upserts,
so the table always reflects the most recent step-run.

The schema is applied idempotently on connect, so no external migration
orchestration is needed:

- `checkpoints.session_id` ← `checkpoint.session_id` (primary key)
- `checkpoints.step` ← `checkpoint.step`
- `checkpoints.payload` ← JSON-encoded `PersistedCheckpoint`
- `checkpoints.created_at` ← RFC 3339 save time
*/

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use crate::runtimes::checkpointer::{Checkpoint, Checkpointer, CheckpointerError, Result};
use crate::runtimes::persistence::PersistedCheckpoint;

const SCHEMA_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS checkpoints (
    session_id TEXT PRIMARY KEY,
    step       INTEGER NOT NULL,
    payload    TEXT NOT NULL,
    created_at TEXT NOT NULL
)
"#;

/// SQLite-backed checkpointer.
///
/// Storage grows with `sessions × state_size`; completed sessions can be
/// dropped with [`Checkpointer::delete`] or directly:
///
/// ```bash
/// sqlite3 agentloop.db "DELETE FROM checkpoints WHERE created_at < datetime('now', '-30 days')"
/// ```
pub struct SqliteCheckpointer {
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteCheckpointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCheckpointer").finish()
    }
}

impl SqliteCheckpointer {
    /// Connect (or create) a SQLite database at `database_url` and apply the
    /// schema. Example URL: `"sqlite://agentloop.db"`.
    #[must_use = "checkpointer must be used to persist state"]
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> std::result::Result<Self, CheckpointerError> {
        // In-memory databases are per-connection; a pool of one keeps every
        // operation on the same database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| CheckpointerError::backend(format!("connect error: {e}")))?;

        sqlx::query(SCHEMA_DDL)
            .execute(&pool)
            .await
            .map_err(|e| CheckpointerError::backend(format!("schema setup: {e}")))?;

        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl Checkpointer for SqliteCheckpointer {
    #[instrument(skip(self, checkpoint), fields(session_id = %checkpoint.session_id), err)]
    async fn save(&self, checkpoint: Checkpoint) -> Result<()> {
        let persisted = PersistedCheckpoint::from(&checkpoint);
        let payload = persisted
            .to_json_string()
            .map_err(|e| CheckpointerError::backend(format!("encode payload: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO checkpoints (session_id, step, payload, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(session_id) DO UPDATE SET
                step = excluded.step,
                payload = excluded.payload,
                created_at = excluded.created_at
            "#,
        )
        .bind(&checkpoint.session_id)
        .bind(checkpoint.step as i64)
        .bind(&payload)
        .bind(persisted.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| CheckpointerError::backend(format!("save checkpoint: {e}")))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn load_latest(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        let row = sqlx::query("SELECT payload FROM checkpoints WHERE session_id = ?1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CheckpointerError::backend(format!("load checkpoint: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let payload: String = row
            .try_get("payload")
            .map_err(|e| CheckpointerError::backend(format!("read payload column: {e}")))?;
        let persisted = PersistedCheckpoint::from_json_str(&payload)
            .map_err(|e| CheckpointerError::backend(format!("decode payload: {e}")))?;
        Ok(Some(Checkpoint::from(persisted)))
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM checkpoints WHERE session_id = ?1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| CheckpointerError::backend(format!("delete checkpoint: {e}")))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_sessions(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT session_id FROM checkpoints ORDER BY session_id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CheckpointerError::backend(format!("list sessions: {e}")))?;
        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("session_id")
                    .map_err(|e| CheckpointerError::backend(format!("read session_id column: {e}")))
            })
            .collect()
    }
}
