//! Metrics definitions for the drinks service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `drinks_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: HTTP methods
//! - `endpoint`: the parameterized route templates plus `/other`
//! - `status`: success, error, timeout
//! - `outcome`: success or an `AuthError` code
//! - `operation`: fixed store operation names

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus metrics recorder and return the handle used to
/// render `/metrics`.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("drinks_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Key fetches are a network round trip to the identity provider
        .set_buckets_for_metric(
            Matcher::Prefix("drinks_jwks_fetch".to_string()),
            &[0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 10.000],
        )
        .map_err(|e| format!("Failed to set JWKS fetch buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("drinks_db_query".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.020, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set DB query buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion.
///
/// Metric: `drinks_http_requests_total`, `drinks_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status` / `status_code`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("drinks_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("drinks_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout.
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize a request path to its route template.
///
/// Drink ids are replaced with `{id}`; anything unrecognized becomes `/other`.
pub fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/drinks" => "/drinks",
        "/drinks-detail" => "/drinks-detail",
        "/health" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        _ => match path.strip_prefix("/drinks/") {
            Some(id) if !id.is_empty() && !id.contains('/') => "/drinks/{id}",
            _ => "/other",
        },
    }
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Record a JWKS fetch.
///
/// Metric: `drinks_jwks_fetch_total`, `drinks_jwks_fetch_duration_seconds`
/// Labels: `outcome` (success, unavailable, malformed)
pub fn record_jwks_fetch(outcome: &str, duration: Duration) {
    histogram!("drinks_jwks_fetch_duration_seconds").record(duration.as_secs_f64());

    counter!("drinks_jwks_fetch_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a token validation result.
///
/// Metric: `drinks_token_validations_total`
/// Labels: `outcome` (success or the failing `AuthError` code)
pub fn record_token_validation(outcome: &str) {
    counter!("drinks_token_validations_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

// ============================================================================
// Store Metrics
// ============================================================================

/// Record a store query.
///
/// Metric: `drinks_db_queries_total`, `drinks_db_query_duration_seconds`
/// Labels: `operation`, `status`
pub fn record_db_query(operation: &str, status: &str, duration: Duration) {
    histogram!("drinks_db_query_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("drinks_db_queries_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
