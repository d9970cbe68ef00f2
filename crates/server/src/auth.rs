//! API key authentication.

use crate::error::{ApiError, INVALID_CREDENTIALS};
use crate::state::ServiceState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Header carrying the shared API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject requests whose `X-API-Key` header does not match the configured key.
///
/// Runs before the body is read, so an unauthenticated request never
/// reaches JSON parsing.
pub async fn require_api_key(
    State(state): State<Arc<ServiceState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(key) if key == state.api_key() => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("Rejected request to {} with invalid API key", request.uri().path());
            Err(ApiError::Forbidden(INVALID_CREDENTIALS.to_string()))
        }
        None => {
            tracing::warn!("Rejected request to {} without API key", request.uri().path());
            Err(ApiError::Forbidden(INVALID_CREDENTIALS.to_string()))
        }
    }
}
