//! Turn lifecycle events for Gridmind streaming responses.
//!
//! A turn moves through `Pending -> Streaming -> {Completed, Failed}`;
//! `TurnEvent` is the wire shape clients consume over SSE.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// Phase of a single user turn through the response pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPhase {
    Pending,
    Streaming,
    Completed,
    Failed,
}

impl TurnPhase {
    /// Whether the phase machine may move from `self` to `next`.
    ///
    /// `Pending -> Failed` covers turns that die before the agent is
    /// invoked (store errors, pre-stream validation).
    pub fn can_advance_to(&self, next: TurnPhase) -> bool {
        matches!(
            (self, next),
            (TurnPhase::Pending, TurnPhase::Streaming)
                | (TurnPhase::Pending, TurnPhase::Failed)
                | (TurnPhase::Streaming, TurnPhase::Completed)
                | (TurnPhase::Streaming, TurnPhase::Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnPhase::Completed | TurnPhase::Failed)
    }
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnPhase::Pending => write!(f, "pending"),
            TurnPhase::Streaming => write!(f, "streaming"),
            TurnPhase::Completed => write!(f, "completed"),
            TurnPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Events emitted while a turn streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// The user message is committed to the durable store; streaming begins.
    Accepted {
        conversation_id: Uuid,
        user_message_id: Uuid,
    },

    /// A chunk of assistant output. Forwarded live, buffered server-side.
    Delta { text: String },

    /// The buffered response was persisted as a single assistant message.
    Completed { assistant_message_id: Uuid },

    /// The turn failed. `question_saved` tells the client whether the user
    /// message survived; it is true for every failure after acceptance.
    Failed { reason: String, question_saved: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_legal_transitions() {
        assert!(TurnPhase::Pending.can_advance_to(TurnPhase::Streaming));
        assert!(TurnPhase::Pending.can_advance_to(TurnPhase::Failed));
        assert!(TurnPhase::Streaming.can_advance_to(TurnPhase::Completed));
        assert!(TurnPhase::Streaming.can_advance_to(TurnPhase::Failed));
    }

    #[test]
    fn test_phase_illegal_transitions() {
        assert!(!TurnPhase::Pending.can_advance_to(TurnPhase::Completed));
        assert!(!TurnPhase::Completed.can_advance_to(TurnPhase::Streaming));
        assert!(!TurnPhase::Failed.can_advance_to(TurnPhase::Pending));
        assert!(!TurnPhase::Streaming.can_advance_to(TurnPhase::Pending));
    }

    #[test]
    fn test_phase_terminal() {
        assert!(!TurnPhase::Pending.is_terminal());
        assert!(!TurnPhase::Streaming.is_terminal());
        assert!(TurnPhase::Completed.is_terminal());
        assert!(TurnPhase::Failed.is_terminal());
    }

    #[test]
    fn test_turn_event_delta_serde() {
        let event = TurnEvent::Delta {
            text: "forecast".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"delta","text":"forecast"}"#);
    }

    #[test]
    fn test_turn_event_failed_serde() {
        let event = TurnEvent::Failed {
            reason: "agent response timed out after 120s".to_string(),
            question_saved: true,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"failed\""));
        assert!(json.contains("\"question_saved\":true"));
        let parsed: TurnEvent = serde_json::from_str(&json).unwrap();
        match parsed {
            TurnEvent::Failed { question_saved, .. } => assert!(question_saved),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
