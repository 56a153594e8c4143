//! SSE stream creation and decoding for the agent gateway.
//!
//! The gateway replies to a turn with an SSE stream of named events:
//! 1. `delta` -- a chunk of reply text, data `{"text": "..."}`
//! 2. `done` -- the reply finished cleanly, no data
//! 3. `error` -- the agent failed mid-reply, data `{"message": "..."}`
//!
//! Unrecognized event names are logged and skipped so the gateway can add
//! event types without breaking older platform versions.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use gridmind_types::error::AgentError;
use gridmind_types::invocation::{AgentEvent, AgentRequest};

/// Data payload of a `delta` event.
#[derive(Deserialize)]
struct DeltaPayload {
    text: String,
}

/// Data payload of an `error` event.
#[derive(Deserialize)]
struct ErrorPayload {
    message: String,
}

/// Create a streaming SSE connection to the agent gateway.
///
/// Returns a `Stream` of [`AgentEvent`]s. The request is sent when the
/// stream is first polled; connection and HTTP-level failures surface as
/// [`AgentError::Invocation`], malformed SSE as [`AgentError::Protocol`].
pub fn create_agent_stream(
    client: reqwest::Client,
    url: String,
    request: AgentRequest,
    api_key: Option<SecretString>,
) -> Pin<Box<dyn Stream<Item = Result<AgentEvent, AgentError>> + Send + 'static>> {
    Box::pin(async_stream::try_stream! {
        let mut builder = client
            .post(&url)
            .header("accept", "text/event-stream")
            .json(&request);
        if let Some(key) = &api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AgentError::Invocation(format!("gateway request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            Err(AgentError::Invocation(format!(
                "gateway returned HTTP {status}: {body}"
            )))?;
            return;
        }

        let mut events = response.bytes_stream().eventsource();
        while let Some(event) = events.next().await {
            let event =
                event.map_err(|e| AgentError::Protocol(format!("SSE decode failed: {e}")))?;
            match event.event.as_str() {
                "delta" => {
                    let payload: DeltaPayload = serde_json::from_str(&event.data)
                        .map_err(|e| AgentError::Protocol(format!("bad delta payload: {e}")))?;
                    yield AgentEvent::Delta { text: payload.text };
                }
                "done" => {
                    yield AgentEvent::Done;
                    break;
                }
                "error" => {
                    let reason = serde_json::from_str::<ErrorPayload>(&event.data)
                        .map(|p| p.message)
                        .unwrap_or(event.data);
                    Err(AgentError::Invocation(reason))?;
                }
                other => {
                    tracing::debug!(event = other, "Ignoring unrecognized gateway event");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_payload_parses() {
        let payload: DeltaPayload =
            serde_json::from_str(r#"{"text": "reserve margins are thin"}"#).unwrap();
        assert_eq!(payload.text, "reserve margins are thin");
    }

    #[test]
    fn test_error_payload_parses() {
        let payload: ErrorPayload =
            serde_json::from_str(r#"{"message": "model backend overloaded"}"#).unwrap();
        assert_eq!(payload.message, "model backend overloaded");
    }

    #[test]
    fn test_error_payload_falls_back_to_raw_data() {
        // Not JSON at all; the pipeline still gets a usable reason string
        let data = "upstream exploded".to_string();
        let reason = serde_json::from_str::<ErrorPayload>(&data)
            .map(|p| p.message)
            .unwrap_or(data.clone());
        assert_eq!(reason, "upstream exploded");
    }
}
