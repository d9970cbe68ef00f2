//! HTTP error responses.
//!
//! Every error body has the shape `{"detail": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Message returned when the API key is missing or wrong.
pub const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// Message returned while the retriever failed to initialize.
pub const RETRIEVER_UNAVAILABLE: &str = "Retriever is not available.";

/// Message returned when embedding or searching fails.
pub const SEARCH_FAILED: &str = "Failed to perform the search.";

/// API error type for returning standard error responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Forbidden (403)
    Forbidden(String),
    /// Unprocessable entity (422)
    UnprocessableEntity(String),
    /// Internal server error (500)
    InternalServerError(String),
    /// Service unavailable (503)
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            ApiError::Forbidden(msg)
            | ApiError::UnprocessableEntity(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status(), self.detail())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "detail": self.detail() }));
        (status, body).into_response()
    }
}
