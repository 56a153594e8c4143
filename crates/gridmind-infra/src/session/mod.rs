//! Session memory backends.
//!
//! Three interchangeable implementations of the `SessionMemory` trait from
//! `gridmind-core`, selected once at startup by `session_backend` in
//! `config.toml`: an in-process cache, a file per session, or a table in
//! the main database.

pub mod file;
pub mod memory;

use std::path::Path;

use gridmind_core::session::SessionHandle;
use gridmind_core::session::adapter::SessionMemory;
use gridmind_types::config::SessionBackendKind;
use gridmind_types::error::SessionBackendError;
use gridmind_types::session::{SessionKey, SessionTurn};

use crate::sqlite::pool::DatabasePool;
use crate::sqlite::session::SqliteSessionStore;
pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

/// The configured session backend, dispatching to one concrete store.
///
/// An enum rather than a trait object because `SessionMemory` is not
/// dyn-compatible (async fn in trait) and the set of backends is closed.
pub enum SessionBackend {
    Cache(MemorySessionStore),
    File(FileSessionStore),
    Relational(SqliteSessionStore),
}

impl SessionBackend {
    /// Build the backend selected by `kind`.
    pub fn build(kind: SessionBackendKind, data_dir: &Path, pool: &DatabasePool) -> Self {
        match kind {
            SessionBackendKind::Cache => SessionBackend::Cache(MemorySessionStore::new()),
            SessionBackendKind::File => {
                SessionBackend::File(FileSessionStore::new(data_dir.join("sessions")))
            }
            SessionBackendKind::Relational => {
                SessionBackend::Relational(SqliteSessionStore::new(pool.clone()))
            }
        }
    }

    pub fn kind(&self) -> SessionBackendKind {
        match self {
            SessionBackend::Cache(_) => SessionBackendKind::Cache,
            SessionBackend::File(_) => SessionBackendKind::File,
            SessionBackend::Relational(_) => SessionBackendKind::Relational,
        }
    }
}

impl SessionMemory for SessionBackend {
    async fn load_or_create(&self, key: &SessionKey) -> Result<SessionHandle, SessionBackendError> {
        match self {
            SessionBackend::Cache(store) => store.load_or_create(key).await,
            SessionBackend::File(store) => store.load_or_create(key).await,
            SessionBackend::Relational(store) => store.load_or_create(key).await,
        }
    }

    async fn append_turns(
        &self,
        handle: &mut SessionHandle,
        from_offset: u64,
        turns: &[SessionTurn],
    ) -> Result<(), SessionBackendError> {
        match self {
            SessionBackend::Cache(store) => store.append_turns(handle, from_offset, turns).await,
            SessionBackend::File(store) => store.append_turns(handle, from_offset, turns).await,
            SessionBackend::Relational(store) => {
                store.append_turns(handle, from_offset, turns).await
            }
        }
    }

    async fn discard(&self, key: &SessionKey) -> Result<(), SessionBackendError> {
        match self {
            SessionBackend::Cache(store) => store.discard(key).await,
            SessionBackend::File(store) => store.discard(key).await,
            SessionBackend::Relational(store) => store.discard(key).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridmind_types::agent::AgentKind;
    use gridmind_types::conversation::SenderRole;
    use uuid::Uuid;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    #[tokio::test]
    async fn test_build_selects_configured_backend() {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_pool().await;

        for kind in [
            SessionBackendKind::Cache,
            SessionBackendKind::File,
            SessionBackendKind::Relational,
        ] {
            let backend = SessionBackend::build(kind, dir.path(), &pool);
            assert_eq!(backend.kind(), kind);
        }
    }

    #[tokio::test]
    async fn test_dispatch_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_pool().await;
        let backend = SessionBackend::build(SessionBackendKind::Cache, dir.path(), &pool);

        let key = SessionKey::for_conversation(AgentKind::Financial, &Uuid::now_v7());
        let mut handle = backend.load_or_create(&key).await.unwrap();
        backend
            .append_turns(
                &mut handle,
                0,
                &[SessionTurn::new(SenderRole::User, "ppa exposure this quarter?")],
            )
            .await
            .unwrap();

        let reloaded = backend.load_or_create(&key).await.unwrap();
        assert_eq!(reloaded.synced_through(), 1);

        backend.discard(&key).await.unwrap();
        assert!(!backend.load_or_create(&key).await.unwrap().is_populated());
    }
}
