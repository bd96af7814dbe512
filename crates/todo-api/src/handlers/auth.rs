//! Session handlers for authenticated users.
//!
//! Both routes sit behind `require_auth`; the identity comes from request
//! extensions.

use crate::auth::AuthenticatedIdentity;
use crate::middleware::RequestId;
use axum::{Extension, Json};
use serde::Serialize;
use tracing::instrument;

/// Public view of the authenticated user.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    /// Firebase user ID.
    pub id: String,

    /// Email address, empty if the token carried none.
    pub email: String,
}

/// Response for `/auth/me`.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    /// The caller.
    pub user: UserSummary,

    /// ID assigned to this request.
    pub request_id: String,
}

/// Response for `/auth/logout`.
#[derive(Debug, Clone, Serialize)]
pub struct LogoutResponse {
    /// Always `true`; logout has no failure mode on the server.
    pub success: bool,

    /// Human-readable confirmation.
    pub message: String,

    /// ID assigned to this request.
    pub request_id: String,
}

/// Handler for GET /auth/me
///
/// ## Response
///
/// ```json
/// {
///   "user": { "id": "u1", "email": "a@b.com" },
///   "request_id": "5b0c..."
/// }
/// ```
#[instrument(skip_all, name = "todo.handlers.me")]
pub async fn get_me(
    Extension(identity): Extension<AuthenticatedIdentity>,
    Extension(request_id): Extension<RequestId>,
) -> Json<MeResponse> {
    tracing::debug!(target: "todo.handlers.auth", "Returning current user");

    Json(MeResponse {
        user: UserSummary {
            id: identity.id,
            email: identity.email,
        },
        request_id: request_id.to_string(),
    })
}

/// Handler for POST /auth/logout
///
/// Tokens are stateless, so logout only records the event; the client
/// discards its token.
#[instrument(skip_all, name = "todo.handlers.logout")]
pub async fn logout(
    Extension(identity): Extension<AuthenticatedIdentity>,
    Extension(request_id): Extension<RequestId>,
) -> Json<LogoutResponse> {
    tracing::info!(
        target: "todo.handlers.auth",
        user_id_prefix = identity.id.get(..4).unwrap_or_default(),
        request_id = %request_id,
        "User logged out"
    );

    Json(LogoutResponse {
        success: true,
        message: "Logged out successfully".to_string(),
        request_id: request_id.to_string(),
    })
}
