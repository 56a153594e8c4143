//! File-per-session memory backend.
//!
//! Stores each session as `{base_dir}/{key}.json`. Session keys are
//! filesystem-safe by construction (`{agent}:{uuid}`), so the key doubles
//! as the file name. Survives restarts without needing the database for
//! session state.

use std::path::PathBuf;

use gridmind_core::session::SessionHandle;
use gridmind_core::session::adapter::SessionMemory;
use gridmind_types::error::SessionBackendError;
use gridmind_types::session::{SessionKey, SessionState, SessionTurn};

/// Filesystem-backed implementation of `SessionMemory`.
pub struct FileSessionStore {
    base_dir: PathBuf,
}

impl FileSessionStore {
    /// Create a store rooted at `base_dir` (usually `{data_dir}/sessions`).
    ///
    /// The directory is created lazily on first write.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    fn session_path(&self, key: &SessionKey) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }
}

impl SessionMemory for FileSessionStore {
    async fn load_or_create(&self, key: &SessionKey) -> Result<SessionHandle, SessionBackendError> {
        let path = self.session_path(key);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SessionHandle::empty(key.clone()));
            }
            Err(err) => {
                return Err(SessionBackendError::Io(format!(
                    "read {}: {err}",
                    path.display()
                )));
            }
        };

        let state: SessionState = serde_json::from_str(&content)
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

        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| {
                SessionBackendError::Io(format!("create {}: {e}", self.base_dir.display()))
            })?;

        let state_json = serde_json::to_string(&handle.to_state())
            .map_err(|e| SessionBackendError::Io(format!("serialize session state: {e}")))?;

        let path = self.session_path(handle.key());
        tokio::fs::write(&path, state_json)
            .await
            .map_err(|e| SessionBackendError::Io(format!("write {}: {e}", path.display())))?;

        Ok(())
    }

    async fn discard(&self, key: &SessionKey) -> Result<(), SessionBackendError> {
        let path = self.session_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SessionBackendError::Io(format!(
                "remove {}: {err}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridmind_types::agent::AgentKind;
    use gridmind_types::conversation::SenderRole;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn key() -> SessionKey {
        SessionKey::for_conversation(AgentKind::Policy, &Uuid::now_v7())
    }

    #[tokio::test]
    async fn test_state_survives_new_store_instance() {
        let dir = tempdir().unwrap();
        let key = key();
        let turns = vec![
            SessionTurn::new(SenderRole::User, "any new grid codes?"),
            SessionTurn::new(SenderRole::Assistant, "one consultation opened"),
        ];

        {
            let store = FileSessionStore::new(dir.path().to_path_buf());
            let mut handle = store.load_or_create(&key).await.unwrap();
            store.append_turns(&mut handle, 0, &turns).await.unwrap();
        }

        // A freshly constructed store sees the same state
        let store = FileSessionStore::new(dir.path().to_path_buf());
        let handle = store.load_or_create(&key).await.unwrap();
        assert_eq!(handle.turns(), turns.as_slice());
        assert_eq!(handle.synced_through(), 2);
    }

    #[tokio::test]
    async fn test_unknown_key_loads_empty() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf());
        let handle = store.load_or_create(&key()).await.unwrap();
        assert!(!handle.is_populated());
    }

    #[tokio::test]
    async fn test_corrupt_file_reported_as_corrupt() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf());
        let key = key();

        tokio::fs::write(dir.path().join(format!("{key}.json")), "{oops")
            .await
            .unwrap();

        let err = store.load_or_create(&key).await;
        assert!(matches!(err, Err(SessionBackendError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_gap_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf());
        let key = key();

        let mut handle = store.load_or_create(&key).await.unwrap();
        store
            .append_turns(&mut handle, 0, &[SessionTurn::new(SenderRole::User, "a")])
            .await
            .unwrap();

        let err = store
            .append_turns(&mut handle, 9, &[SessionTurn::new(SenderRole::User, "b")])
            .await;
        assert!(matches!(err, Err(SessionBackendError::Gap { .. })));

        let reloaded = store.load_or_create(&key).await.unwrap();
        assert_eq!(reloaded.turns().len(), 1);
    }

    #[tokio::test]
    async fn test_discard_removes_file() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf());
        let key = key();

        let mut handle = store.load_or_create(&key).await.unwrap();
        store
            .append_turns(&mut handle, 0, &[SessionTurn::new(SenderRole::User, "hi")])
            .await
            .unwrap();
        assert!(dir.path().join(format!("{key}.json")).exists());

        store.discard(&key).await.unwrap();
        assert!(!dir.path().join(format!("{key}.json")).exists());

        // Idempotent on a missing file
        store.discard(&key).await.unwrap();
    }
}
