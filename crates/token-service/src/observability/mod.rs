//! Observability module for the token service.
//!
//! # Privacy by Default
//!
//! Handlers use `#[instrument(skip_all)]` and allow-list safe fields:
//! - **SAFE**: room names, publisher flag, status labels
//! - **HASHED**: participant identities (see [`hash_for_correlation`])
//! - **NEVER**: the API secret and minted tokens

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// Lets an operator follow one identity across log lines without the
/// identity itself appearing in them.
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(digest.get(..4).unwrap_or_default())
}
