use crate::config::Config;
use crate::errors::TsError;
use common::grants::{AccessClaims, RoomGrant, MAX_JWT_SIZE_BYTES};
use common::secret::{ExposeSecret, SecretString};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;
use tracing::instrument;

/// Signs and verifies provider access tokens (HS256 over the API secret).
///
/// Built once at startup. Bad key material is rejected here so that a
/// misconfigured deployment fails before serving any request.
#[derive(Clone)]
pub struct TokenSigner {
    api_key: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("api_key", &self.api_key)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl TokenSigner {
    /// Create a signer for the given API key and secret.
    ///
    /// # Errors
    ///
    /// Returns `TsError::Signing` if either value is empty.
    pub fn new(api_key: &str, api_secret: &SecretString) -> Result<Self, TsError> {
        if api_key.is_empty() {
            return Err(TsError::Signing("API key must not be empty".to_string()));
        }

        let secret = api_secret.expose_secret().as_bytes();
        if secret.is_empty() {
            return Err(TsError::Signing("API secret must not be empty".to_string()));
        }

        Ok(Self {
            api_key: api_key.to_string(),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        })
    }

    /// Create a signer from service configuration.
    pub fn from_config(config: &Config) -> Result<Self, TsError> {
        Self::new(&config.api_key, &config.api_secret)
    }

    /// Build claims for one identity in one room.
    ///
    /// `now` is the Unix timestamp used for `nbf`; `exp` is `now + ttl_seconds`.
    pub fn claims_for(
        &self,
        room: &str,
        identity: &str,
        is_publisher: bool,
        now: i64,
        ttl_seconds: i64,
    ) -> AccessClaims {
        AccessClaims {
            iss: self.api_key.clone(),
            sub: identity.to_string(),
            name: identity.to_string(),
            nbf: now,
            exp: now + ttl_seconds,
            jti: uuid::Uuid::new_v4().to_string(),
            video: RoomGrant::for_room(room, is_publisher),
        }
    }

    /// Sign claims into a compact JWT.
    #[instrument(skip_all)]
    pub fn sign(&self, claims: &AccessClaims) -> Result<String, TsError> {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| TsError::Signing(format!("JWT signing operation failed: {}", e)))
    }

    /// Verify a token minted by this signer and return its claims.
    ///
    /// Validates size, signature, issuer, `exp` and `nbf`.
    #[instrument(skip_all)]
    pub fn verify(&self, token: &str) -> Result<AccessClaims, TsError> {
        if token.len() > MAX_JWT_SIZE_BYTES {
            tracing::debug!(
                target: "token_service.crypto",
                token_size = token.len(),
                max_size = MAX_JWT_SIZE_BYTES,
                "Token rejected: size exceeds maximum allowed"
            );
            return Err(TsError::BadRequest(
                "The access token is invalid or expired".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[self.api_key.as_str()]);

        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!(target: "token_service.crypto", error = %e, "Token verification failed");
                TsError::BadRequest("The access token is invalid or expired".to_string())
            })?;

        Ok(token_data.claims)
    }
}
