//! Custom test assertions for expressive tests
//!
//! Tokens are decoded with the fixture secret, so every assertion also
//! checks that the token was signed with [`TEST_API_SECRET`].

use crate::fixtures::{TEST_API_KEY, TEST_API_SECRET};
use common::grants::AccessClaims;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

/// Decode and verify a token minted by a test server.
pub fn decode_test_token(token: &str) -> AccessClaims {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[TEST_API_KEY]);

    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(TEST_API_SECRET.as_bytes()),
        &validation,
    )
    .expect("token should verify with the fixture secret")
    .claims
}

/// Custom assertions for minted tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_for_room("room-kr")
///     .assert_for_identity("audience-1")
///     .assert_can_publish(false);
/// ```
pub trait TokenAssertions {
    /// Assert HS256 JWT structure with a verifiable signature
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert the grant names the given room
    fn assert_for_room(&self, room: &str) -> &Self;

    /// Assert `sub` and `name` are the given identity
    fn assert_for_identity(&self, identity: &str) -> &Self;

    /// Assert the publish (and admin) grant
    fn assert_can_publish(&self, expected: bool) -> &Self;

    /// Assert the token expires within the specified seconds
    fn assert_expires_in(&self, seconds: i64) -> &Self;
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        assert_eq!(
            self.split('.').count(),
            3,
            "JWT must have 3 parts (header.payload.signature)"
        );

        let header = decode_header(self).expect("Failed to parse JWT header");
        assert_eq!(header.alg, Algorithm::HS256, "Expected HS256 algorithm");
        assert_eq!(header.typ.as_deref(), Some("JWT"), "Expected JWT type");

        let claims = decode_test_token(self);
        assert!(claims.video.room_join, "Every token must grant roomJoin");
        assert!(
            claims.video.can_subscribe,
            "Every token must grant canSubscribe"
        );

        self
    }

    fn assert_for_room(&self, room: &str) -> &Self {
        let claims = decode_test_token(self);
        assert_eq!(
            claims.video.room, room,
            "Expected room '{}', got '{}'",
            room, claims.video.room
        );
        self
    }

    fn assert_for_identity(&self, identity: &str) -> &Self {
        let claims = decode_test_token(self);
        assert_eq!(claims.sub, identity, "Unexpected subject");
        assert_eq!(claims.name, identity, "Unexpected display name");
        self
    }

    fn assert_can_publish(&self, expected: bool) -> &Self {
        let claims = decode_test_token(self);
        assert_eq!(
            claims.video.can_publish, expected,
            "Expected canPublish={}",
            expected
        );
        assert_eq!(
            claims.video.room_admin, expected,
            "Expected roomAdmin={}",
            expected
        );
        self
    }

    fn assert_expires_in(&self, seconds: i64) -> &Self {
        let claims = decode_test_token(self);
        let expires_in = claims.exp - chrono::Utc::now().timestamp();

        // Allow 5-second tolerance for slow test runners
        assert!(
            (expires_in - seconds).abs() <= 5,
            "Expected token to expire in {} seconds, but expires in {} seconds",
            seconds,
            expires_in
        );
        self
    }
}
