//! Conversation CRUD HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/v1/conversations                - List the caller's conversations
//! - GET    /api/v1/conversations/{id}           - Get a single conversation
//! - GET    /api/v1/conversations/{id}/messages  - Get messages for a conversation
//! - DELETE /api/v1/conversations/{id}           - Delete a conversation and its messages
//!
//! Every endpoint is owner-scoped; a conversation owned by someone else is
//! a 403 regardless of its id being guessable.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use gridmind_types::agent::AgentKind;
use gridmind_types::conversation::{Conversation, Message};
use gridmind_types::error::EntitlementError;

use crate::http::error::AppError;
use crate::http::extractors::auth::CallerIdentity;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Query parameters for conversation listing.
#[derive(Debug, Deserialize)]
pub struct ConversationListQuery {
    /// Filter by agent (market, pricing, news, policy, financial, maintenance).
    pub agent: Option<String>,
}

/// Query parameters for message listing.
#[derive(Debug, Deserialize)]
pub struct MessageListQuery {
    #[serde(default = "default_message_limit")]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

fn default_message_limit() -> Option<i64> {
    Some(100)
}

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid UUID: {s}")))
}

/// Parse an agent name, returning a 400 error on unknown agents.
fn parse_agent(s: &str) -> Result<AgentKind, AppError> {
    s.parse::<AgentKind>()
        .map_err(|_| EntitlementError::UnknownAgent(s.to_string()).into())
}

/// GET /api/v1/conversations - List the caller's conversations, newest first.
pub async fn list_conversations(
    State(state): State<AppState>,
    CallerIdentity(user_id): CallerIdentity,
    Query(query): Query<ConversationListQuery>,
) -> Result<Json<ApiResponse<Vec<Conversation>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let agent = match query.agent.as_deref() {
        Some(name) => Some(parse_agent(name)?),
        None => None,
    };

    let conversations = state.conversations.list(&user_id, agent).await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(conversations, request_id, elapsed)
        .with_link("self", "/api/v1/conversations");

    Ok(Json(resp))
}

/// GET /api/v1/conversations/{id} - Get a conversation by ID.
pub async fn get_conversation(
    State(state): State<AppState>,
    CallerIdentity(user_id): CallerIdentity,
    Path(conversation_id): Path<String>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = parse_uuid(&conversation_id)?;
    let conversation = state.conversations.get_owned(&id, &user_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(conversation, request_id, elapsed)
        .with_link("self", &format!("/api/v1/conversations/{id}"))
        .with_link(
            "messages",
            &format!("/api/v1/conversations/{id}/messages"),
        );

    Ok(Json(resp))
}

/// GET /api/v1/conversations/{id}/messages - Message history, oldest first.
pub async fn get_messages(
    State(state): State<AppState>,
    CallerIdentity(user_id): CallerIdentity,
    Path(conversation_id): Path<String>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = parse_uuid(&conversation_id)?;
    let messages = state
        .conversations
        .messages(&id, &user_id, query.limit, query.offset)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(messages, request_id, elapsed)
        .with_link(
            "self",
            &format!("/api/v1/conversations/{id}/messages"),
        )
        .with_link("conversation", &format!("/api/v1/conversations/{id}"));

    Ok(Json(resp))
}

/// DELETE /api/v1/conversations/{id} - Delete a conversation and its messages.
pub async fn delete_conversation(
    State(state): State<AppState>,
    CallerIdentity(user_id): CallerIdentity,
    Path(conversation_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = parse_uuid(&conversation_id)?;
    state.conversations.delete(&id, &user_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(
        serde_json::json!({"deleted": true}),
        request_id,
        elapsed,
    );

    Ok(Json(resp))
}
