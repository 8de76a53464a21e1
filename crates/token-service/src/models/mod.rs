//! Request and response models for the token service.

use crate::errors::TsError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Query parameters for `GET /token`.
///
/// All fields are optional at the extractor level so that a missing
/// parameter surfaces as our own `BadRequest` body rather than an axum
/// rejection.
#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub room: Option<String>,
    pub identity: Option<String>,
    pub is_publisher: Option<String>,
}

impl TokenQuery {
    /// Parse the publisher flag. Absent means listener.
    pub fn publisher_flag(&self) -> Result<bool, TsError> {
        match self.is_publisher.as_deref() {
            None => Ok(false),
            Some(value) => parse_flag(value).ok_or_else(|| {
                TsError::BadRequest(format!(
                    "Invalid is_publisher value: expected true or false, got '{}'",
                    value
                ))
            }),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Response body for a minted credential.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed access token.
    pub token: String,
    /// Streaming endpoint the client connects to.
    pub url: String,
    /// Room the token grants, echoed from the request.
    pub room: String,
    /// Identity the token is bound to, echoed from the request.
    pub identity: String,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token", &"[REDACTED]")
            .field("url", &self.url)
            .field("room", &self.room)
            .field("identity", &"[REDACTED]")
            .finish()
    }
}
