//! Test server harness for E2E testing
//!
//! Provides `TestTokenServer` for spawning real token service instances in
//! tests.

use crate::fixtures::test_env_vars;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use token_service::config::Config;
use token_service::crypto::TokenSigner;
use token_service::routes::{self, AppState};
use tokio::task::JoinHandle;

/// Test harness for spawning the token service in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_token_flow_e2e() -> Result<(), anyhow::Error> {
///     let server = TestTokenServer::spawn().await?;
///
///     let response = reqwest::get(format!(
///         "{}/token?room=room-en&identity=audience-1",
///         server.url()
///     ))
///     .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestTokenServer {
    addr: SocketAddr,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestTokenServer {
    /// Spawn a server with the fixture configuration.
    ///
    /// The server binds to a random available port (127.0.0.1:0) and runs
    /// in the background until dropped.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(HashMap::new()).await
    }

    /// Spawn a server with fixture variables overridden by `overrides`.
    pub async fn spawn_with_vars(
        overrides: HashMap<String, String>,
    ) -> Result<Self, anyhow::Error> {
        let mut vars = test_env_vars();
        vars.extend(overrides);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Invalid test configuration: {}", e))?;
        let signer = TokenSigner::from_config(&config)
            .map_err(|e| anyhow::anyhow!("Failed to build signer: {}", e))?;

        let state = Arc::new(AppState {
            config: config.clone(),
            signer,
        });

        // The global recorder can only be installed once per test process;
        // later servers get a standalone recorder instead.
        let metrics_handle = match routes::init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => PrometheusBuilder::new().build_recorder().handle(),
        };

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind(config.bind_address.as_str())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get reference to the server configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestTokenServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
