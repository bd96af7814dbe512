//! Todo API error types.
//!
//! All errors map to appropriate HTTP status codes via the `IntoResponse` impl.
//! Error messages returned to clients are intentionally generic to avoid
//! leaking internal details. Actual errors are logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::jwt::{TokenError, GENERIC_REJECTION_MESSAGE};
use serde::Serialize;
use thiserror::Error;

/// Todo API error type.
///
/// Maps to appropriate HTTP status codes:
/// - InvalidToken: 401 Unauthorized
/// - ServiceUnavailable: 503 Service Unavailable
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidToken(_) => 401,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }
}

/// `KeyFetchError` maps to 503; every other rejection is a 401 carrying the
/// generic message.
impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::KeyFetchError => {
                ApiError::ServiceUnavailable("signing keys unavailable".to_string())
            }
            _ => ApiError::InvalidToken(GENERIC_REJECTION_MESSAGE.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::InvalidToken(reason) => {
                (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", reason.clone())
            }
            ApiError::ServiceUnavailable(reason) => {
                // Log actual reason server-side
                tracing::warn!(target: "todo.availability", reason = %reason, "Service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) = "Bearer realm=\"todo-api\", error=\"invalid_token\"".parse() {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}
