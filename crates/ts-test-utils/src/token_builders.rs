//! Builder for `GET /token` requests.

use token_service::models::TokenResponse;

/// Builder for token requests against a running service.
///
/// # Example
/// ```rust,ignore
/// let response = TokenRequest::new("room-vn", TEST_INTERPRETER_VN_ID)
///     .publisher(true)
///     .send(&server.url())
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct TokenRequest {
    room: Option<String>,
    identity: Option<String>,
    is_publisher: Option<String>,
}

impl TokenRequest {
    /// Request for a listener token.
    pub fn new(room: &str, identity: &str) -> Self {
        Self {
            room: Some(room.to_string()),
            identity: Some(identity.to_string()),
            is_publisher: None,
        }
    }

    /// Request with no parameters at all.
    pub fn empty() -> Self {
        Self {
            room: None,
            identity: None,
            is_publisher: None,
        }
    }

    /// Drop the `room` parameter.
    pub fn without_room(mut self) -> Self {
        self.room = None;
        self
    }

    /// Drop the `identity` parameter.
    pub fn without_identity(mut self) -> Self {
        self.identity = None;
        self
    }

    /// Set `is_publisher` to `true` or `false`.
    pub fn publisher(self, is_publisher: bool) -> Self {
        self.publisher_raw(if is_publisher { "true" } else { "false" })
    }

    /// Set `is_publisher` to an arbitrary string.
    pub fn publisher_raw(mut self, value: &str) -> Self {
        self.is_publisher = Some(value.to_string());
        self
    }

    /// Query pairs in request order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(room) = &self.room {
            pairs.push(("room", room.clone()));
        }
        if let Some(identity) = &self.identity {
            pairs.push(("identity", identity.clone()));
        }
        if let Some(flag) = &self.is_publisher {
            pairs.push(("is_publisher", flag.clone()));
        }
        pairs
    }

    /// Send the request and return the raw response.
    pub async fn send_raw(&self, base_url: &str) -> Result<reqwest::Response, anyhow::Error> {
        let response = reqwest::Client::new()
            .get(format!("{}/token", base_url))
            .query(&self.query_pairs())
            .send()
            .await?;
        Ok(response)
    }

    /// Send the request, requiring a 200 response.
    pub async fn send(&self, base_url: &str) -> Result<TokenResponse, anyhow::Error> {
        let response = self.send_raw(base_url).await?;
        if !response.status().is_success() {
            anyhow::bail!(
                "token request failed with {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            );
        }
        Ok(response.json::<TokenResponse>().await?)
    }
}
