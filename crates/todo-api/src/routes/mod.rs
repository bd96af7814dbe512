//! HTTP routes for the Todo API.
//!
//! Defines the Axum router and application state.

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::handlers;
use crate::middleware::{assign_request_id, require_auth, AuthState};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Firebase ID token verifier.
    pub verifier: Arc<TokenVerifier>,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/` - Service info - public
/// - `/api/health` - Liveness check - public
/// - `/metrics` - Prometheus metrics endpoint - public
/// - `/auth/me` - Current user - requires authentication
/// - `/auth/logout` - Logout - requires authentication
/// - Request ID tagging
/// - TraceLayer for request logging
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let auth_state = Arc::new(AuthState {
        verifier: state.verifier.clone(),
    });

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/", get(handlers::service_info))
        .route("/api/health", get(handlers::health_check))
        .with_state(state.clone());

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::get_me))
        .route("/auth/logout", post(handlers::logout))
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth))
        .with_state(state);

    // Merge routes and apply global middleware layers
    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. assign_request_id - Tag every request, including rejected ones (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(assign_request_id))
}
