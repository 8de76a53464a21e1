//! Token Service
//!
//! Entry point for the Babel Booth credential issuer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use token_service::config::Config;
use token_service::crypto::TokenSigner;
use token_service::routes::{self, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "token_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Token Service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        livekit_url = %config.livekit_url,
        token_ttl_seconds = config.token_ttl_seconds,
        "Configuration loaded successfully"
    );

    let signer = TokenSigner::from_config(&config).map_err(|e| {
        error!("Failed to initialize token signer: {}", e);
        e
    })?;

    let metrics_handle = routes::init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    let bind_address = config.bind_address.clone();
    let drain_seconds = config.drain_seconds;

    let state = Arc::new(AppState { config, signer });
    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Token Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(drain_seconds))
        .await?;

    info!("Token Service shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
/// Returns when a shutdown signal is received and the drain period is complete.
async fn shutdown_signal(drain_seconds: u64) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    if drain_seconds > 0 {
        warn!("Draining connections for {} seconds...", drain_seconds);
        tokio::time::sleep(Duration::from_secs(drain_seconds)).await;
        info!("Drain period complete");
    } else {
        info!("Skipping drain period (DRAIN_SECONDS=0)");
    }
}
