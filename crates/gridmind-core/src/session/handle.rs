//! In-memory session view and the positional append rules.
//!
//! `apply_turns` is the single implementation of the idempotency contract:
//! every backend applies batches through it before persisting, so replayed
//! and overlapping deliveries stay no-ops everywhere.

use gridmind_types::error::SessionBackendError;
use gridmind_types::session::{SessionKey, SessionState, SessionTurn};

/// One session's turns plus the offset bookkeeping that ties them to the
/// durable store.
///
/// `base_offset` is the store position of the first retained turn, so
/// `synced_through()` is the count of store messages this session reflects.
/// An ephemeral handle lives only for the current turn: it is used when the
/// backend is unavailable and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    key: SessionKey,
    base_offset: u64,
    turns: Vec<SessionTurn>,
    ephemeral: bool,
}

impl SessionHandle {
    /// A fresh, persistable handle with no turns.
    pub fn empty(key: SessionKey) -> Self {
        Self {
            key,
            base_offset: 0,
            turns: Vec::new(),
            ephemeral: false,
        }
    }

    /// A handle that will never touch a backend.
    pub fn ephemeral(key: SessionKey) -> Self {
        Self {
            ephemeral: true,
            ..Self::empty(key)
        }
    }

    /// Rehydrate a handle from persisted backend state.
    pub fn from_state(key: SessionKey, state: SessionState) -> Self {
        Self {
            key,
            base_offset: state.base_offset,
            turns: state.turns,
            ephemeral: false,
        }
    }

    /// The persistable form of this handle.
    pub fn to_state(&self) -> SessionState {
        SessionState {
            base_offset: self.base_offset,
            turns: self.turns.clone(),
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    pub fn turns(&self) -> &[SessionTurn] {
        &self.turns
    }

    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    /// Whether any turn has been applied.
    pub fn is_populated(&self) -> bool {
        !self.turns.is_empty()
    }

    /// How many store messages this session reflects.
    pub fn synced_through(&self) -> u64 {
        self.base_offset + self.turns.len() as u64
    }

    /// At most the last `window` turns, for agent context.
    pub fn recent(&self, window: usize) -> &[SessionTurn] {
        let start = self.turns.len().saturating_sub(window);
        &self.turns[start..]
    }

    /// Demote this handle to turn-local memory; backends are no longer
    /// written for it.
    pub fn make_ephemeral(&mut self) {
        self.ephemeral = true;
    }

    /// Apply a batch of turns positioned at `from_offset` in the store.
    ///
    /// The rules, in order:
    /// - an empty handle rebases to `from_offset` (windowed reconstruction
    ///   starts mid-conversation);
    /// - a batch starting beyond `synced_through()` is a gap and is
    ///   rejected rather than applied out of place;
    /// - a batch ending at or before `synced_through()` is a replayed
    ///   delivery and is a no-op;
    /// - otherwise only the unseen tail is appended.
    ///
    /// Returns how many turns were actually appended.
    pub fn apply_turns(
        &mut self,
        from_offset: u64,
        turns: &[SessionTurn],
    ) -> Result<usize, SessionBackendError> {
        if self.turns.is_empty() {
            self.base_offset = from_offset;
        }

        let synced = self.synced_through();
        if from_offset > synced {
            return Err(SessionBackendError::Gap {
                expected: synced,
                got: from_offset,
            });
        }

        let already_seen = (synced - from_offset) as usize;
        if already_seen >= turns.len() {
            return Ok(0);
        }

        let tail = &turns[already_seen..];
        self.turns.extend_from_slice(tail);
        Ok(tail.len())
    }
}
