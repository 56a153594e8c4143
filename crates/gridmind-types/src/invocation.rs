//! Agent gateway invocation types for Gridmind.
//!
//! These model the wire shapes for the upstream agent runtime: the request
//! envelope for one turn and the events of one streamed reply.

use serde::{Deserialize, Serialize};

use crate::agent::AgentKind;
use crate::session::SessionTurn;

/// Request to the agent runtime for one streamed reply.
///
/// `history` carries the recent session window only; the prompt is the new
/// user message and is not part of the history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub agent: AgentKind,
    pub prompt: String,
    pub history: Vec<SessionTurn>,
}

/// Events emitted during one streamed agent reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A chunk of reply text.
    Delta { text: String },

    /// The reply finished cleanly.
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::SenderRole;

    #[test]
    fn test_agent_request_serialize() {
        let request = AgentRequest {
            agent: AgentKind::Market,
            prompt: "how tight is the evening peak?".to_string(),
            history: vec![SessionTurn::new(SenderRole::User, "hello")],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"agent\":\"market\""));
        assert!(json.contains("\"history\""));
    }

    #[test]
    fn test_agent_event_serde() {
        let event = AgentEvent::Delta {
            text: "reserve margin".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"delta","text":"reserve margin"}"#);

        let done: AgentEvent = serde_json::from_str(r#"{"type":"done"}"#).unwrap();
        assert!(matches!(done, AgentEvent::Done));
    }
}
