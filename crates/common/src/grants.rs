//! Access token claims shared by the issuer and its consumers.
//!
//! The layout matches what the streaming provider expects from a
//! LiveKit-style access token:
//!
//! ```json
//! {
//!   "iss": "<api key>",
//!   "sub": "<identity>",
//!   "name": "<identity>",
//!   "nbf": 1700000000,
//!   "exp": 1700021600,
//!   "jti": "0f9c...",
//!   "video": {
//!     "room": "room-kr",
//!     "roomJoin": true,
//!     "canSubscribe": true,
//!     "canPublish": false,
//!     "roomAdmin": false
//!   }
//! }
//! ```
//!
//! `canPublish` is always serialized. The provider treats an absent
//! `canPublish` as permissive, so listener tokens must carry an explicit
//! `false`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Maximum accepted token size in bytes when decoding.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Default token lifetime (6 hours, the provider SDK default).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Shortest configurable token lifetime.
pub const MIN_TOKEN_TTL: Duration = Duration::from_secs(60);

/// Longest configurable token lifetime.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Room-scoped permissions embedded in an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomGrant {
    /// Room the holder may join.
    pub room: String,
    pub room_join: bool,
    pub can_subscribe: bool,
    /// Send permission; only publishers get `true`.
    pub can_publish: bool,
    /// Publishers also get room admin, matching the original deployment.
    pub room_admin: bool,
}

impl RoomGrant {
    /// Grant for joining `room`, with publish rights when `is_publisher`.
    #[must_use]
    pub fn for_room(room: &str, is_publisher: bool) -> Self {
        Self {
            room: room.to_string(),
            room_join: true,
            can_subscribe: true,
            can_publish: is_publisher,
            room_admin: is_publisher,
        }
    }
}

/// Access token claims.
///
/// `sub` and `name` carry the participant identity and are redacted in
/// Debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Issuer (provider API key).
    pub iss: String,

    /// Subject (participant identity).
    pub sub: String,

    /// Display name; same as the identity.
    pub name: String,

    /// Not-before timestamp (Unix epoch seconds).
    pub nbf: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Unique token id. Two tokens minted in the same second still differ.
    pub jti: String,

    /// Room grant.
    pub video: RoomGrant,
}

impl fmt::Debug for AccessClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessClaims")
            .field("iss", &self.iss)
            .field("sub", &"[REDACTED]")
            .field("name", &"[REDACTED]")
            .field("nbf", &self.nbf)
            .field("exp", &self.exp)
            .field("jti", &self.jti)
            .field("video", &self.video)
            .finish()
    }
}

impl AccessClaims {
    /// Whether this token allows publishing into its room.
    #[must_use]
    pub fn is_publisher(&self) -> bool {
        self.video.can_publish
    }

    /// Claims equal in everything except the per-mint fields
    /// (`jti`, `nbf`, `exp`).
    #[must_use]
    pub fn equivalent_to(&self, other: &Self) -> bool {
        self.iss == other.iss
            && self.sub == other.sub
            && self.name == other.name
            && self.video == other.video
    }
}
