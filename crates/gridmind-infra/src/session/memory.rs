//! In-process session memory backend.
//!
//! A concurrent map keyed by session key. Fastest backend, but state dies
//! with the process and is invisible to other instances, so it suits a
//! single-node deployment where sessions are rebuilt from the store on
//! restart anyway.

use dashmap::DashMap;

use gridmind_core::session::SessionHandle;
use gridmind_core::session::adapter::SessionMemory;
use gridmind_types::error::SessionBackendError;
use gridmind_types::session::{SessionKey, SessionState, SessionTurn};

/// DashMap-backed implementation of `SessionMemory`.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, SessionState>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Number of sessions currently held.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionMemory for MemorySessionStore {
    async fn load_or_create(&self, key: &SessionKey) -> Result<SessionHandle, SessionBackendError> {
        Ok(match self.sessions.get(key.as_str()) {
            Some(state) => SessionHandle::from_state(key.clone(), state.clone()),
            None => SessionHandle::empty(key.clone()),
        })
    }

    async fn append_turns(
        &self,
        handle: &mut SessionHandle,
        from_offset: u64,
        turns: &[SessionTurn],
    ) -> Result<(), SessionBackendError> {
        handle.apply_turns(from_offset, turns)?;
        self.sessions
            .insert(handle.key().as_str().to_string(), handle.to_state());
        Ok(())
    }

    async fn discard(&self, key: &SessionKey) -> Result<(), SessionBackendError> {
        self.sessions.remove(key.as_str());
        Ok(())
    }
}
