//! Conversation and message types for Gridmind.
//!
//! A conversation is an append-only log of turns between one user and one
//! agent. The durable store is the single source of truth; session memory
//! is always reconstructible from these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::agent::AgentKind;

/// Author of a turn within a conversation.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'assistant'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    User,
    Assistant,
}

impl fmt::Display for SenderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderRole::User => write!(f, "user"),
            SenderRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for SenderRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(SenderRole::User),
            "assistant" => Ok(SenderRole::Assistant),
            other => Err(format!("invalid sender role: '{other}'")),
        }
    }
}

/// A conversation between a user and an agent.
///
/// Conversations belong to a single owner and a single agent kind; the
/// pairing is fixed at creation and drives the session memory key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub agent: AgentKind,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single message within a conversation.
///
/// Messages are append-only and totally ordered by `(created_at, id)`;
/// UUIDv7 ids keep the tiebreak stable when timestamps collide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: SenderRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
