//! Metrics definitions for the token service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `ts_` prefix for the token service
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `role`: 2 values (listener, publisher)
//! - `status`: 2 values (success, error)
//! - `error_category`: 3 values (validation, signing, internal)
//! - `endpoint`: known paths, everything else is `/other`

use metrics::{counter, histogram};
use std::time::Duration;

// ============================================================================
// Token Metrics
// ============================================================================

/// Record token issuance duration and outcome
///
/// Metric: `ts_token_issuance_duration_seconds`, `ts_token_issuance_total`
/// Labels: `role`, `status`
pub fn record_token_issuance(role: &str, status: &str, duration: Duration) {
    histogram!("ts_token_issuance_duration_seconds", "role" => role.to_string(), "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("ts_token_issuance_total", "role" => role.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record a rejected or failed issuance by category
///
/// Metric: `ts_token_errors_total`
/// Labels: `error_category`
pub fn record_token_error(error_category: &str) {
    counter!("ts_token_errors_total", "error_category" => error_category.to_string())
        .increment(1);
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `ts_http_requests_total`, `ts_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("ts_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("ts_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/token" => "/token",
        "/health" => "/health",
        "/metrics" => "/metrics",
        _ => "/other",
    }
}
