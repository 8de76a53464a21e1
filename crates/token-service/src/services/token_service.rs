use crate::config::Config;
use crate::crypto::TokenSigner;
use crate::errors::TsError;
use crate::models::{TokenQuery, TokenResponse};
use crate::observability::{hash_for_correlation, metrics};
use chrono::Utc;
use common::rooms::RoomName;
use std::time::Instant;
use tracing::instrument;

/// Mint an access token for one identity in one room.
///
/// Validates the query, signs fresh claims and records the audit event.
/// Nothing is persisted and no provider call is made: two identical
/// requests produce two independent tokens.
#[instrument(skip_all, name = "ts.service.issue_room_token")]
pub fn issue_room_token(
    signer: &TokenSigner,
    config: &Config,
    query: &TokenQuery,
) -> Result<TokenResponse, TsError> {
    let start = Instant::now();
    let result = mint(signer, config, query);

    let role = match query.publisher_flag() {
        Ok(true) => "publisher",
        Ok(false) => "listener",
        Err(_) => "unknown",
    };
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::record_token_issuance(role, status, start.elapsed());
    if let Err(e) = &result {
        metrics::record_token_error(e.category());
    }

    result
}

fn mint(
    signer: &TokenSigner,
    config: &Config,
    query: &TokenQuery,
) -> Result<TokenResponse, TsError> {
    let room = required_param(query.room.as_deref(), "room")?;
    let identity = required_param(query.identity.as_deref(), "identity")?;
    let is_publisher = query.publisher_flag()?;

    if RoomName::new(room).language().is_none() {
        tracing::debug!(
            target: "token_service.service",
            room = %room,
            "Room name is outside the language convention"
        );
    }

    let claims = signer.claims_for(
        room,
        identity,
        is_publisher,
        Utc::now().timestamp(),
        config.token_ttl_seconds,
    );
    let token = signer.sign(&claims)?;

    tracing::info!(
        target: "token_service.audit",
        room = %room,
        identity_hash = %hash_for_correlation(identity),
        is_publisher,
        expires_at = claims.exp,
        "Access token issued"
    );

    Ok(TokenResponse {
        token,
        url: config.livekit_url.clone(),
        room: room.to_string(),
        identity: identity.to_string(),
    })
}

fn required_param<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, TsError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(TsError::BadRequest(format!("Parameter '{}' must not be empty", name))),
        None => Err(TsError::BadRequest(format!("Missing required parameter '{}'", name))),
    }
}
