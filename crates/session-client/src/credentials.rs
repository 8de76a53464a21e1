//! Credential acquisition.
//!
//! Every connect attempt, including each reconnect, fetches a fresh
//! credential; credentials are never cached.

use crate::config::SessionConfig;
use crate::error::CredentialError;
use async_trait::async_trait;
use common::rooms::{Identity, RoomName};
use common::secret::SecretString;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// What a session asks the issuer for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRequest {
    pub room: RoomName,
    pub identity: Identity,
    pub is_publisher: bool,
}

/// A minted credential and the endpoint it is valid for.
#[derive(Debug, Clone)]
pub struct Credential {
    /// Signed access token.
    pub token: SecretString,
    /// Streaming endpoint to connect to.
    pub url: String,
}

/// Source of access credentials.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Fetch a credential for `request`.
    async fn fetch(&self, request: &CredentialRequest) -> Result<Credential, CredentialError>;
}

/// Issuer response body. `room` and `identity` are echoed back but not
/// needed here.
#[derive(Deserialize)]
struct IssuedCredential {
    token: String,
    url: String,
}

/// Fetches credentials from the token service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCredentialSource {
    token_url: String,
    http_client: reqwest::Client,
}

impl HttpCredentialSource {
    /// Create a source for the issuer at `issuer_url` (scheme, host and
    /// optional path prefix; `/token` is appended).
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Transport` if the HTTP client cannot be
    /// built.
    pub fn new(issuer_url: &str, timeout: Duration) -> Result<Self, CredentialError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CredentialError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            token_url: format!("{}/token", issuer_url.trim_end_matches('/')),
            http_client,
        })
    }

    /// Create a source using `config`'s request timeout.
    ///
    /// # Errors
    ///
    /// See [`HttpCredentialSource::new`].
    pub fn with_config(issuer_url: &str, config: &SessionConfig) -> Result<Self, CredentialError> {
        Self::new(issuer_url, config.http_timeout)
    }
}

#[async_trait]
impl CredentialSource for HttpCredentialSource {
    #[instrument(skip_all, fields(room = %request.room, is_publisher = request.is_publisher))]
    async fn fetch(&self, request: &CredentialRequest) -> Result<Credential, CredentialError> {
        debug!(
            target: "session_client.credentials",
            url = %self.token_url,
            "Requesting credential"
        );

        let response = self
            .http_client
            .get(&self.token_url)
            .query(&[
                ("room", request.room.as_str()),
                ("identity", request.identity.as_str()),
                ("is_publisher", if request.is_publisher { "true" } else { "false" }),
            ])
            .send()
            .await
            .map_err(|e| {
                debug!(target: "session_client.credentials", error = %e, "HTTP request failed");
                CredentialError::Transport(e.to_string())
            })?;

        let status = response.status();

        if status.is_success() {
            let issued: IssuedCredential = response.json().await.map_err(|e| {
                warn!(target: "session_client.credentials", error = %e, "Failed to parse issuer response");
                CredentialError::InvalidResponse(e.to_string())
            })?;

            return Ok(Credential {
                token: SecretString::from(issued.token),
                url: issued.url,
            });
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(target: "session_client.credentials", error = %e, "Failed to read issuer error body");
                String::new()
            }
        };

        // Timeouts and throttling are transient even though they are 4xx.
        let transient =
            status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::TOO_MANY_REQUESTS;

        if status.is_client_error() && !transient {
            warn!(
                target: "session_client.credentials",
                status = %status,
                "Issuer rejected credential request"
            );
            Err(CredentialError::Rejected {
                status: status.as_u16(),
                message: body,
            })
        } else {
            warn!(
                target: "session_client.credentials",
                status = %status,
                "Issuer request failed transiently"
            );
            Err(CredentialError::Transport(format!(
                "Issuer returned {}",
                status
            )))
        }
    }
}
