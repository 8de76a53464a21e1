//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports the [`secrecy`] types used across Babel Booth for the
//! provider API secret and for minted access tokens. `SecretString` redacts
//! itself in `Debug`, so a struct that derives `Debug` over a secret field
//! stays safe to log.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct IssuedCredential {
//!     url: String,
//!     token: SecretString,
//! }
//!
//! let credential = IssuedCredential {
//!     url: "wss://example.livekit.cloud".to_string(),
//!     token: SecretString::from("eyJhbGciOi..."),
//! };
//!
//! // The token is redacted
//! let debug = format!("{credential:?}");
//! assert!(!debug.contains("eyJhbGciOi"));
//!
//! // Explicit access only
//! let raw: &str = credential.token.expose_secret();
//! assert!(raw.starts_with("eyJ"));
//! ```
//!
//! Use `SecretString` for:
//! - The provider API secret (`LIVEKIT_SECRET`)
//! - Access tokens handed from the issuer to a session client

pub use secrecy::{ExposeSecret, SecretString};
