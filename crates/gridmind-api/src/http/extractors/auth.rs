//! Caller identity extractor.
//!
//! Authentication is an external boundary: the fronting gateway validates
//! the caller's token and forwards the resolved user id in the `x-user-id`
//! header. This extractor only parses that header; requests without a valid
//! UUID are rejected with 401.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::http::error::AppError;

/// The authenticated caller. Extracting this parses the `x-user-id` header.
#[derive(Debug)]
pub struct CallerIdentity(pub Uuid);

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(CallerIdentity(extract_user_id(parts)?))
    }
}

/// Extract the caller's UUID from the `x-user-id` header.
fn extract_user_id(parts: &Parts) -> Result<Uuid, AppError> {
    let Some(value) = parts.headers.get("x-user-id") else {
        return Err(AppError::Unauthorized(
            "Missing x-user-id header. The fronting gateway must set it to the caller's user UUID.".to_string(),
        ));
    };

    let value = value.to_str().map_err(|_| {
        AppError::Unauthorized("Invalid x-user-id header encoding".to_string())
    })?;

    value.trim().parse::<Uuid>().map_err(|_| {
        AppError::Unauthorized(format!(
            "Invalid x-user-id header: '{}' is not a UUID",
            value.trim()
        ))
    })
}
