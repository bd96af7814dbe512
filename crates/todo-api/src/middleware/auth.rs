//! Authentication middleware for protected routes.
//!
//! Extracts the Bearer token from the Authorization header, verifies it with
//! the [`TokenVerifier`], and injects the caller's identity into request
//! extensions.

use crate::auth::TokenVerifier;
use crate::errors::ApiError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// Firebase ID token verifier.
    pub verifier: Arc<TokenVerifier>,
}

/// Authentication middleware that verifies Firebase ID tokens.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// - 401 Unauthorized with WWW-Authenticate header if the token is missing or rejected
/// - 503 Service Unavailable if the signing keys cannot be fetched
/// - Otherwise continues to the next handler with an
///   [`AuthenticatedIdentity`](crate::auth::AuthenticatedIdentity) in extensions
#[instrument(skip(state, req, next), name = "todo.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    // Extract Authorization header
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "todo.middleware.auth", "Missing Authorization header");
            ApiError::InvalidToken("Missing Authorization header".to_string())
        })?;

    // Extract Bearer token
    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::debug!(target: "todo.middleware.auth", "Invalid Authorization header format");
        ApiError::InvalidToken("Invalid Authorization header format".to_string())
    })?;

    let identity = state.verifier.verify(token).await?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
