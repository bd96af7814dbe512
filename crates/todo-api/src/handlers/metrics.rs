//! Prometheus metrics endpoint handler.
//!
//! # Security
//!
//! This endpoint is unauthenticated to allow Prometheus to scrape metrics.
//! Labels carry only rejection kinds and fetch status, never token contents
//! or user identifiers.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns Prometheus-formatted metrics for scraping.
///
/// # Response
///
/// ```text
/// # TYPE todo_token_verifications_total counter
/// todo_token_verifications_total{outcome="success"} 42
/// ```
#[tracing::instrument(skip_all, name = "todo.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
