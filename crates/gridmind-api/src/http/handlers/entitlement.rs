//! Entitlement view endpoint.
//!
//! GET /api/v1/entitlement - The caller's plan, hired agents, and quota usage.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::extractors::auth::CallerIdentity;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/entitlement - Current entitlement with the monthly reset applied.
///
/// Users without a provisioned row see the basic defaults (nothing hired);
/// reading never creates a row.
pub async fn get_entitlement(
    State(state): State<AppState>,
    CallerIdentity(user_id): CallerIdentity,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let entitlement = state.gate.entitlement_for(user_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let data = serde_json::json!({
        "plan": entitlement.plan,
        "hired_agents": &entitlement.hired_agents,
        "monthly_query_count": entitlement.monthly_query_count,
        "quota_ceiling": entitlement.quota_ceiling(),
        "remaining": entitlement.remaining(),
        "last_query_at": entitlement.last_query_at,
    });

    let resp = ApiResponse::success(data, request_id, elapsed)
        .with_link("self", "/api/v1/entitlement");

    Ok(Json(resp))
}
