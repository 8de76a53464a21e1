//! Fixed credentials and identities for deterministic tests.

use std::collections::HashMap;

// Provider credentials
pub const TEST_API_KEY: &str = "APItestkey";
pub const TEST_API_SECRET: &str = "test-api-secret-for-signing-0123456789";
pub const TEST_LIVEKIT_URL: &str = "wss://babel-booth-test.livekit.cloud";

// Participant identities
pub const TEST_AUDIENCE_ID: &str = "audience-1700000000000";
pub const TEST_INTERPRETER_VN_ID: &str = "interpreter-vn-1700000000000";
pub const TEST_NAMED_INTERPRETER_ID: &str = "interpreter-kr-booth";

/// Environment variables for a valid token service configuration.
///
/// Binds to an ephemeral loopback port.
pub fn test_env_vars() -> HashMap<String, String> {
    HashMap::from([
        ("LIVEKIT_API_KEY".to_string(), TEST_API_KEY.to_string()),
        ("LIVEKIT_SECRET".to_string(), TEST_API_SECRET.to_string()),
        ("LIVEKIT_URL".to_string(), TEST_LIVEKIT_URL.to_string()),
        ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
    ])
}
