//! Health check and service info handlers.

use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// Service name reported by the root endpoint.
pub const SERVICE_NAME: &str = "todo-api";

/// Response for `/api/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always "ok" while the process is serving requests.
    pub status: String,

    /// Build version from configuration.
    pub version: String,

    /// Current server time (RFC 3339, UTC).
    pub timestamp: String,
}

/// Response for `/`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfoResponse {
    pub name: String,
    pub version: String,
    pub status: String,
}

/// Handler for GET /api/health
///
/// Liveness check. Does not contact the key endpoint.
///
/// ## Example Response
///
/// ```json
/// {
///   "status": "ok",
///   "version": "1.0.0",
///   "timestamp": "2026-01-01T00:00:00.000Z"
/// }
/// ```
#[instrument(skip_all, name = "todo.health.check")]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.config.build_version.clone(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Handler for GET /
#[instrument(skip_all, name = "todo.health.info")]
pub async fn service_info(State(state): State<Arc<AppState>>) -> Json<ServiceInfoResponse> {
    Json(ServiceInfoResponse {
        name: SERVICE_NAME.to_string(),
        version: state.config.build_version.clone(),
        status: "online".to_string(),
    })
}
