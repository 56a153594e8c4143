//! Session synchronizer: keeps session memory consistent with the store.
//!
//! The durable store always wins. An empty or discarded session is rebuilt
//! from at most the last `recency_window` messages; a populated one is
//! advanced by exactly the missing delta. Backend trouble degrades the
//! handle to ephemeral and the turn proceeds from the store alone.

use gridmind_types::conversation::Conversation;
use gridmind_types::error::{SessionBackendError, StoreError};
use gridmind_types::session::{SessionKey, SessionTurn};
use tracing::warn;
use uuid::Uuid;

use crate::conversation::store::MessageStore;
use crate::session::adapter::SessionMemory;
use crate::session::handle::SessionHandle;

/// Reconciles sessions with the durable message store.
///
/// This is the only component that writes session backends; the pipeline
/// persists to the store and re-synchronizes, which keeps every session a
/// prefix-consistent view of its conversation even under interleaving.
pub struct SessionSynchronizer<S: SessionMemory> {
    memory: S,
    recency_window: usize,
}

impl<S: SessionMemory> SessionSynchronizer<S> {
    pub fn new(memory: S, recency_window: usize) -> Self {
        Self {
            memory,
            recency_window,
        }
    }

    pub fn recency_window(&self) -> usize {
        self.recency_window
    }

    /// Access the underlying backend.
    pub fn memory(&self) -> &S {
        &self.memory
    }

    /// Bring the session for `conversation` up to date with the store and
    /// return it.
    ///
    /// Deterministic and idempotent: with no intervening store writes, a
    /// second call is a no-op. Only store errors propagate; every backend
    /// error is absorbed by degrading to an ephemeral handle.
    pub async fn synchronize<R: MessageStore>(
        &self,
        store: &R,
        conversation: &Conversation,
    ) -> Result<SessionHandle, StoreError> {
        let key = SessionKey::for_conversation(conversation.agent, &conversation.id);
        let total = store.count_messages(&conversation.id).await?;

        let mut handle = match self.memory.load_or_create(&key).await {
            Ok(handle) => handle,
            Err(err) => {
                warn!(session_key = %key, error = %err, "Session backend unavailable, serving turn from durable store");
                return self
                    .rebuild_ephemeral(store, key, &conversation.id, total)
                    .await;
            }
        };

        for _ in 0..2 {
            if handle.synced_through() > total {
                // The session claims more history than the store holds
                // (e.g. a restored database backup). The store wins.
                warn!(
                    session_key = %key,
                    synced_through = handle.synced_through(),
                    store_total = total,
                    "Session ahead of durable store, discarding"
                );
                handle = self.reset(handle).await;
            }

            if handle.synced_through() == total {
                return Ok(handle);
            }

            let from = if handle.is_populated() {
                handle.synced_through()
            } else {
                self.window_start(total)
            };
            let turns = self.fetch_turns(store, &conversation.id, from, total).await?;

            if handle.is_ephemeral() {
                // fresh-or-behind by construction, so this cannot gap
                let _ = handle.apply_turns(from, &turns);
                return Ok(handle);
            }

            match self.memory.append_turns(&mut handle, from, &turns).await {
                Ok(()) => return Ok(handle),
                Err(SessionBackendError::Gap { expected, got }) => {
                    warn!(session_key = %key, expected, got, "Session moved underneath sync, rebuilding");
                    handle = self.reset(handle).await;
                }
                Err(err) => {
                    warn!(session_key = %key, error = %err, "Session backend write failed, continuing with ephemeral session");
                    handle.make_ephemeral();
                    let _ = handle.apply_turns(from, &turns);
                    return Ok(handle);
                }
            }
        }

        // Two passes could not settle; serve this turn from the store alone.
        warn!(session_key = %key, "Session backend unstable, serving turn from durable store");
        self.rebuild_ephemeral(store, key, &conversation.id, total)
            .await
    }

    /// Where a windowed reconstruction starts for a store of `total` messages.
    fn window_start(&self, total: u64) -> u64 {
        total.saturating_sub(self.recency_window as u64)
    }

    async fn fetch_turns<R: MessageStore>(
        &self,
        store: &R,
        conversation_id: &Uuid,
        from: u64,
        total: u64,
    ) -> Result<Vec<SessionTurn>, StoreError> {
        let missing = total.saturating_sub(from);
        if missing == 0 {
            return Ok(Vec::new());
        }
        let messages = store
            .list_messages(conversation_id, Some(missing as i64), Some(from as i64))
            .await?;
        Ok(messages
            .into_iter()
            .map(|m| SessionTurn::new(m.role, m.content))
            .collect())
    }

    /// Discard persisted state and hand back an empty handle; a failed
    /// discard degrades to ephemeral instead of risking stale state.
    async fn reset(&self, handle: SessionHandle) -> SessionHandle {
        let key = handle.key().clone();
        if handle.is_ephemeral() {
            return SessionHandle::ephemeral(key);
        }
        match self.memory.discard(&key).await {
            Ok(()) => SessionHandle::empty(key),
            Err(err) => {
                warn!(session_key = %key, error = %err, "Failed to discard stale session, continuing ephemeral");
                SessionHandle::ephemeral(key)
            }
        }
    }

    async fn rebuild_ephemeral<R: MessageStore>(
        &self,
        store: &R,
        key: SessionKey,
        conversation_id: &Uuid,
        total: u64,
    ) -> Result<SessionHandle, StoreError> {
        let from = self.window_start(total);
        let turns = self.fetch_turns(store, conversation_id, from, total).await?;
        let mut handle = SessionHandle::ephemeral(key);
        let _ = handle.apply_turns(from, &turns);
        Ok(handle)
    }
}
