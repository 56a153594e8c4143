//! SSE streaming turn endpoint.
//!
//! POST /api/v1/agents/{agent}/chat/stream
//!
//! Runs one user turn: admission through the entitlement gate, conversation
//! resolution, then the streaming pipeline. The pipeline commits the user
//! message before invoking the agent and persists the assistant reply only
//! on completion; this handler just maps its lifecycle events onto SSE.
//!
//! SSE event types:
//! - `conversation` (turn accepted): `{ "conversation_id", "user_message_id", "remaining" }`
//! - `delta` (incremental text): `{ "text": "..." }`
//! - `done` (turn complete): `{ "assistant_message_id": "..." }`
//! - `error` (turn failed): `{ "reason": "...", "question_saved": bool }`

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tracing::Instrument;
use uuid::Uuid;

use gridmind_observe::agent_attrs;
use gridmind_types::agent::AgentKind;
use gridmind_types::error::EntitlementError;
use gridmind_types::turn::TurnEvent;

use crate::http::error::AppError;
use crate::http::extractors::auth::CallerIdentity;
use crate::state::AppState;

/// Request body for the streaming turn endpoint.
#[derive(Debug, Deserialize)]
pub struct StreamTurnRequest {
    /// Existing conversation to continue; if absent, an empty conversation
    /// is reused or created.
    pub conversation_id: Option<Uuid>,
    /// The user message to send to the agent.
    pub message: String,
}

/// SSE event name and JSON payload for one turn lifecycle event.
fn event_payload(event: &TurnEvent, remaining: u32) -> (&'static str, serde_json::Value) {
    match event {
        TurnEvent::Accepted {
            conversation_id,
            user_message_id,
        } => (
            "conversation",
            serde_json::json!({
                "conversation_id": conversation_id,
                "user_message_id": user_message_id,
                "remaining": remaining,
            }),
        ),
        TurnEvent::Delta { text } => ("delta", serde_json::json!({ "text": text })),
        TurnEvent::Completed {
            assistant_message_id,
        } => (
            "done",
            serde_json::json!({ "assistant_message_id": assistant_message_id }),
        ),
        TurnEvent::Failed {
            reason,
            question_saved,
        } => (
            "error",
            serde_json::json!({ "reason": reason, "question_saved": question_saved }),
        ),
    }
}

/// POST /api/v1/agents/{agent}/chat/stream: SSE streaming turn.
///
/// Admission runs before anything else and is charge-on-attempt: a turn
/// that later fails still counts against the month.
pub async fn stream_chat(
    State(state): State<AppState>,
    CallerIdentity(user_id): CallerIdentity,
    Path(agent): Path<String>,
    Json(body): Json<StreamTurnRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let agent: AgentKind = agent
        .parse()
        .map_err(|_| EntitlementError::UnknownAgent(agent.clone()))?;

    if body.message.trim().is_empty() {
        return Err(AppError::Validation(
            "message must not be empty".to_string(),
        ));
    }

    let admission = state.gate.authorize(user_id, agent).await?;

    let conversation = state
        .conversations
        .resolve_for_turn(user_id, agent, body.conversation_id)
        .await?;

    let invoke_span = tracing::info_span!(
        "invoke_agent",
        otel.name = %agent_attrs::span_name(agent_attrs::OP_INVOKE_AGENT, &agent.to_string()),
        gen_ai.operation.name = agent_attrs::OP_INVOKE_AGENT,
        gen_ai.provider.name = agent_attrs::PROVIDER_GATEWAY,
        gen_ai.agent.name = %agent,
        gen_ai.conversation.id = %conversation.id,
    );

    let remaining = admission.remaining;
    let mut turn_events = state
        .pipeline
        .clone()
        .stream_turn(conversation, user_id, body.message);

    // Build the SSE stream. Polling through the span keeps every pipeline
    // event attributed to this invocation.
    let sse_stream = async_stream::stream! {
        while let Some(event) = turn_events.next().instrument(invoke_span.clone()).await {
            let (name, payload) = event_payload(&event, remaining);
            yield Ok::<_, Infallible>(Event::default().event(name).data(payload.to_string()));
        }
    };

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_payload_carries_ids_and_quota() {
        let conversation_id = Uuid::now_v7();
        let user_message_id = Uuid::now_v7();
        let (name, payload) = event_payload(
            &TurnEvent::Accepted {
                conversation_id,
                user_message_id,
            },
            12,
        );
        assert_eq!(name, "conversation");
        assert_eq!(payload["conversation_id"], conversation_id.to_string());
        assert_eq!(payload["user_message_id"], user_message_id.to_string());
        assert_eq!(payload["remaining"], 12);
    }

    #[test]
    fn test_delta_payload() {
        let (name, payload) = event_payload(
            &TurnEvent::Delta {
                text: "imbalance price".to_string(),
            },
            0,
        );
        assert_eq!(name, "delta");
        assert_eq!(payload["text"], "imbalance price");
    }

    #[test]
    fn test_done_payload() {
        let assistant_message_id = Uuid::now_v7();
        let (name, payload) = event_payload(
            &TurnEvent::Completed {
                assistant_message_id,
            },
            3,
        );
        assert_eq!(name, "done");
        assert_eq!(
            payload["assistant_message_id"],
            assistant_message_id.to_string()
        );
    }

    #[test]
    fn test_error_payload_keeps_question_flag() {
        let (name, payload) = event_payload(
            &TurnEvent::Failed {
                reason: "agent response timed out after 120s".to_string(),
                question_saved: true,
            },
            3,
        );
        assert_eq!(name, "error");
        assert_eq!(payload["reason"], "agent response timed out after 120s");
        assert_eq!(payload["question_saved"], true);
    }

    #[test]
    fn test_stream_request_deserializes_without_conversation() {
        let body: StreamTurnRequest =
            serde_json::from_str(r#"{"message": "What moved the price?"}"#).unwrap();
        assert!(body.conversation_id.is_none());
        assert_eq!(body.message, "What moved the price?");
    }
}
