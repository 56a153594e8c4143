//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use gridmind_types::error::{EntitlementError, GateError, StoreError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Admission refusals from the entitlement gate.
    Entitlement(EntitlementError),
    /// Conversation store errors.
    Store(StoreError),
    /// Missing or malformed caller identity.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<EntitlementError> for AppError {
    fn from(e: EntitlementError) -> Self {
        AppError::Entitlement(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}

impl From<GateError> for AppError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::Entitlement(e) => AppError::Entitlement(e),
            GateError::Store(e) => AppError::Store(e),
        }
    }
}

/// Status, machine code, and client-safe message for a store error.
///
/// Connection and query details stay in the logs; clients get a generic
/// message.
fn store_parts(e: &StoreError) -> (StatusCode, &'static str, String) {
    match e {
        StoreError::NotFound => (
            StatusCode::NOT_FOUND,
            "CONVERSATION_NOT_FOUND",
            "Conversation not found".to_string(),
        ),
        StoreError::Forbidden => (
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "Conversation belongs to another user".to_string(),
        ),
        StoreError::Conflict(msg) => (StatusCode::BAD_REQUEST, "AGENT_MISMATCH", msg.clone()),
        StoreError::Connection | StoreError::Query(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORE_ERROR",
            "Conversation store unavailable".to_string(),
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Entitlement(e @ EntitlementError::UnknownAgent(_)) => {
                (StatusCode::BAD_REQUEST, "UNKNOWN_AGENT", e.to_string())
            }
            AppError::Entitlement(e @ EntitlementError::NotHired { .. }) => {
                (StatusCode::FORBIDDEN, "AGENT_NOT_HIRED", e.to_string())
            }
            AppError::Entitlement(e @ EntitlementError::PlanRequired { .. }) => {
                (StatusCode::FORBIDDEN, "PLAN_REQUIRED", e.to_string())
            }
            AppError::Entitlement(e @ EntitlementError::QuotaExceeded { .. }) => {
                (StatusCode::TOO_MANY_REQUESTS, "QUOTA_EXCEEDED", e.to_string())
            }
            AppError::Store(e) => store_parts(e),
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        if status.is_server_error() {
            tracing::error!(code, %message, "Request failed");
        }

        let body = ApiResponse::error(code, &message, String::new(), 0);
        (status, Json(body)).into_response()
    }
}
