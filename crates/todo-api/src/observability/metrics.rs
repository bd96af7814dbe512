//! Metrics definitions for the Todo API.
//!
//! All metrics follow Prometheus naming conventions:
//! - `todo_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `outcome`: `success` or one of the ten `TokenError::kind` codes
//! - `status`: 2 values (success, error)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus recorder and return its handle.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Verification includes one network round trip to the key endpoint
        .set_buckets_for_metric(
            Matcher::Prefix("todo_token_verification".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set token verification buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Token Verification Metrics
// ============================================================================

/// Record the outcome of one bearer-token verification.
///
/// Metric: `todo_token_verifications_total`, `todo_token_verification_duration_seconds`
/// Labels: `outcome`
pub fn record_token_verification(outcome: &'static str, duration: Duration) {
    histogram!("todo_token_verification_duration_seconds",
        "outcome" => outcome
    )
    .record(duration.as_secs_f64());

    counter!("todo_token_verifications_total",
        "outcome" => outcome
    )
    .increment(1);
}

/// Record one fetch of the signing-certificate key set.
///
/// Metric: `todo_key_set_fetches_total`
/// Labels: `status`
pub fn record_key_set_fetch(status: &'static str) {
    counter!("todo_key_set_fetches_total",
        "status" => status
    )
    .increment(1);
}
