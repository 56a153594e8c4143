//! Dashboard statistics endpoint.
//!
//! GET /api/v1/stats - Aggregate counts for the service dashboard.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use gridmind_core::conversation::store::MessageStore;

use crate::http::error::AppError;
use crate::http::extractors::auth::CallerIdentity;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/stats - Aggregate dashboard statistics.
///
/// Returns conversation and message totals across all users plus process
/// uptime. Uses COUNT(*) queries on the read pool.
pub async fn get_stats(
    State(state): State<AppState>,
    CallerIdentity(_user_id): CallerIdentity,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let total_conversations = state.conversations.store().count_all_conversations().await?;
    let total_messages = state.conversations.store().count_all_messages().await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let data = serde_json::json!({
        "total_conversations": total_conversations,
        "total_messages": total_messages,
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
    });

    let resp = ApiResponse::success(data, request_id, elapsed)
        .with_link("self", "/api/v1/stats")
        .with_link("conversations", "/api/v1/conversations");

    Ok(Json(resp))
}
