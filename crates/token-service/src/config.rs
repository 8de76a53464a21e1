//! Token service configuration.
//!
//! Loaded from environment variables. The provider API secret is held as a
//! `SecretString` and redacted in Debug output.

use common::grants::{DEFAULT_TOKEN_TTL, MAX_TOKEN_TTL, MIN_TOKEN_TTL};
use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default listen port when neither `BIND_ADDRESS` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 8000;

/// Default graceful-shutdown drain period in seconds.
pub const DEFAULT_DRAIN_SECONDS: u64 = 0;

/// Token service configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8000").
    pub bind_address: String,

    /// Provider API key, used as the token issuer (`iss`).
    pub api_key: String,

    /// Provider API secret used to sign tokens.
    pub api_secret: SecretString,

    /// Streaming endpoint handed back to clients (ws:// or wss://).
    pub livekit_url: String,

    /// Lifetime of minted tokens in seconds.
    pub token_ttl_seconds: i64,

    /// Seconds to keep draining connections after a shutdown signal.
    pub drain_seconds: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("livekit_url", &self.livekit_url)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("drain_seconds", &self.drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid signing key material: {0}")]
    InvalidSigningKey(String),

    #[error("Invalid provider URL: {0}")]
    InvalidProviderUrl(String),

    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Invalid token TTL configuration: {0}")]
    InvalidTokenTtl(String),

    #[error("Invalid drain period: {0}")]
    InvalidDrainSeconds(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let api_key = vars
            .get("LIVEKIT_API_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("LIVEKIT_API_KEY".to_string()))?
            .trim()
            .to_string();

        if api_key.is_empty() {
            return Err(ConfigError::InvalidSigningKey(
                "LIVEKIT_API_KEY must not be empty".to_string(),
            ));
        }

        // LIVEKIT_API_SECRET is the provider CLI's name for the same value.
        let api_secret = vars
            .get("LIVEKIT_SECRET")
            .or_else(|| vars.get("LIVEKIT_API_SECRET"))
            .ok_or_else(|| ConfigError::MissingEnvVar("LIVEKIT_SECRET".to_string()))?;

        if api_secret.is_empty() {
            return Err(ConfigError::InvalidSigningKey(
                "LIVEKIT_SECRET must not be empty".to_string(),
            ));
        }
        let api_secret = SecretString::from(api_secret.clone());

        let livekit_url = vars
            .get("LIVEKIT_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("LIVEKIT_URL".to_string()))?
            .trim()
            .to_string();

        if !(livekit_url.starts_with("wss://") || livekit_url.starts_with("ws://")) {
            return Err(ConfigError::InvalidProviderUrl(format!(
                "LIVEKIT_URL must use ws:// or wss://, got '{}'",
                livekit_url
            )));
        }

        let bind_address = match vars.get("BIND_ADDRESS") {
            Some(address) => address.clone(),
            None => {
                let port = match vars.get("PORT") {
                    Some(value_str) => value_str.parse::<u16>().map_err(|e| {
                        ConfigError::InvalidPort(format!(
                            "PORT must be a valid port number, got '{}': {}",
                            value_str, e
                        ))
                    })?,
                    None => DEFAULT_PORT,
                };
                format!("0.0.0.0:{}", port)
            }
        };

        // Parse token TTL with validation
        let token_ttl_seconds = if let Some(value_str) = vars.get("TOKEN_TTL_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidTokenTtl(format!(
                    "TOKEN_TTL_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            let min = MIN_TOKEN_TTL.as_secs() as i64;
            let max = MAX_TOKEN_TTL.as_secs() as i64;
            if value < min || value > max {
                return Err(ConfigError::InvalidTokenTtl(format!(
                    "TOKEN_TTL_SECONDS must be between {} and {}, got {}",
                    min, max, value
                )));
            }

            value
        } else {
            DEFAULT_TOKEN_TTL.as_secs() as i64
        };

        let drain_seconds = match vars.get("DRAIN_SECONDS") {
            Some(value_str) => value_str.parse().map_err(|e| {
                ConfigError::InvalidDrainSeconds(format!(
                    "DRAIN_SECONDS must be a non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?,
            None => DEFAULT_DRAIN_SECONDS,
        };

        Ok(Config {
            bind_address,
            api_key,
            api_secret,
            livekit_url,
            token_ttl_seconds,
            drain_seconds,
        })
    }
}
