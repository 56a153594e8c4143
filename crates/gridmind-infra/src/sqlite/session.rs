//! SQLite session memory backend.
//!
//! Implements `SessionMemory` from `gridmind-core` with one row per session
//! in the `session_records` table. The session state is stored as a JSON
//! blob; `synced_through` is kept alongside for operator inspection.

use gridmind_core::session::SessionHandle;
use gridmind_core::session::adapter::SessionMemory;
use gridmind_types::error::SessionBackendError;
use gridmind_types::session::{SessionKey, SessionState, SessionTurn};
use chrono::Utc;
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionMemory`.
///
/// Survives restarts and is shared across processes pointing at the same
/// database, at the cost of one write per synchronized turn.
pub struct SqliteSessionStore {
    pool: DatabasePool,
}

impl SqliteSessionStore {
    /// Create a new session store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl SessionMemory for SqliteSessionStore {
    async fn load_or_create(&self, key: &SessionKey) -> Result<SessionHandle, SessionBackendError> {
        let row = sqlx::query("SELECT state FROM session_records WHERE session_key = ?")
            .bind(key.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| SessionBackendError::Unavailable(e.to_string()))?;

        let Some(row) = row else {
            return Ok(SessionHandle::empty(key.clone()));
        };

        let state_json: String = row
            .try_get("state")
            .map_err(|e| SessionBackendError::Unavailable(e.to_string()))?;
        let state: SessionState = serde_json::from_str(&state_json)
            .map_err(|e| SessionBackendError::Corrupt(format!("session {key}: {e}")))?;

        Ok(SessionHandle::from_state(key.clone(), state))
    }

    async fn append_turns(
        &self,
        handle: &mut SessionHandle,
        from_offset: u64,
        turns: &[SessionTurn],
    ) -> Result<(), SessionBackendError> {
        handle.apply_turns(from_offset, turns)?;

        let state_json = serde_json::to_string(&handle.to_state())
            .map_err(|e| SessionBackendError::Io(format!("serialize session state: {e}")))?;

        sqlx::query(
            r#"INSERT INTO session_records (session_key, state, synced_through, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT (session_key) DO UPDATE SET
                   state = excluded.state,
                   synced_through = excluded.synced_through,
                   updated_at = excluded.updated_at"#,
        )
        .bind(handle.key().as_str())
        .bind(&state_json)
        .bind(handle.synced_through() as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| SessionBackendError::Unavailable(e.to_string()))?;

        Ok(())
    }

    async fn discard(&self, key: &SessionKey) -> Result<(), SessionBackendError> {
        sqlx::query("DELETE FROM session_records WHERE session_key = ?")
            .bind(key.as_str())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| SessionBackendError::Unavailable(e.to_string()))?;

        Ok(())
    }
}
