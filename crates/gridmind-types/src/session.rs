//! Session memory key, turn, and persisted-state types for Gridmind.
//!
//! A session is the short-term memory of one (agent, conversation) pair.
//! Backends persist `SessionState` opaquely; everything else treats the
//! durable message store as the source of truth.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

use crate::agent::AgentKind;
use crate::conversation::SenderRole;

/// Deterministic identity of one session: an (agent, conversation) pair.
///
/// The derivation is pure, so every component addressing the same pair
/// lands on the same session. The rendered form is filesystem-safe and
/// doubles as the primary key in the relational and file backends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    /// Derive the session key for an agent/conversation pair.
    pub fn for_conversation(agent: AgentKind, conversation_id: &Uuid) -> Self {
        SessionKey(format!("{agent}:{conversation_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One conversational turn held in session memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTurn {
    pub role: SenderRole,
    pub content: String,
}

impl SessionTurn {
    pub fn new(role: SenderRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Persisted form of a session, shared by every backend.
///
/// `base_offset` is the store position of the first retained turn; a
/// session reconstructed mid-conversation starts at a non-zero base.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub base_offset: u64,
    pub turns: Vec<SessionTurn>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_deterministic() {
        let id = Uuid::now_v7();
        let a = SessionKey::for_conversation(AgentKind::Market, &id);
        let b = SessionKey::for_conversation(AgentKind::Market, &id);
        assert_eq!(a, b);
    }

    #[test]
    fn test_session_key_distinct_per_agent() {
        let id = Uuid::now_v7();
        let a = SessionKey::for_conversation(AgentKind::Market, &id);
        let b = SessionKey::for_conversation(AgentKind::Policy, &id);
        assert_ne!(a, b);
    }

    #[test]
    fn test_session_key_display() {
        let id = Uuid::now_v7();
        let key = SessionKey::for_conversation(AgentKind::News, &id);
        let rendered = key.to_string();
        assert!(rendered.starts_with("news:"));
        assert!(rendered.contains(&id.to_string()));
    }

    #[test]
    fn test_session_state_serde_roundtrip() {
        let state = SessionState {
            base_offset: 12,
            turns: vec![
                SessionTurn::new(SenderRole::User, "how windy is tomorrow?"),
                SessionTurn::new(SenderRole::Assistant, "a front arrives overnight"),
            ],
        };
        let json = serde_json::to_string(&state).unwrap();
        let parsed: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.base_offset, 12);
        assert_eq!(parsed.turns, state.turns);
    }

    #[test]
    fn test_session_state_default() {
        let state = SessionState::default();
        assert_eq!(state.base_offset, 0);
        assert!(state.turns.is_empty());
    }
}
