//! HTTP routes for the token service.
//!
//! Defines the Axum router, application state and the Prometheus recorder.

use crate::config::Config;
use crate::crypto::TokenSigner;
use crate::handlers;
use crate::middleware::http_metrics_middleware;
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Signer built from the configured API key and secret.
    pub signer: TokenSigner,
}

/// Install the global Prometheus recorder.
///
/// # Errors
///
/// Returns error if a recorder is already installed in this process.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("ts_http_request".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("ts_token_issuance".to_string()),
            &[0.0005, 0.001, 0.002, 0.005, 0.010, 0.025, 0.050, 0.100],
        )
        .map_err(|e| format!("Failed to set token issuance buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Build the application routes.
///
/// - `/token` - mint an access token
/// - `/health` - liveness probe
/// - `/metrics` - Prometheus metrics
///
/// Layer order (outermost first): metrics middleware, timeout, trace.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let api_routes = Router::new()
        .route("/token", get(handlers::get_token))
        .route("/health", get(handlers::health_check))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    api_routes
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}
