//! Integration tests for `GET /token`.

use common::rooms::{Identity, Language};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use ts_test_utils::{
    decode_test_token, TestTokenServer, TokenAssertions, TokenRequest, TEST_AUDIENCE_ID,
    TEST_INTERPRETER_VN_ID, TEST_LIVEKIT_URL, TEST_NAMED_INTERPRETER_ID,
};

// ============================================================================
// Successful issuance
// ============================================================================

#[tokio::test]
async fn test_listener_token_matches_request() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;

    let response = TokenRequest::new("room-en", TEST_AUDIENCE_ID)
        .send(&server.url())
        .await?;

    assert_eq!(response.url, TEST_LIVEKIT_URL);
    assert_eq!(response.room, "room-en");
    assert_eq!(response.identity, TEST_AUDIENCE_ID);
    response
        .token
        .assert_valid_jwt()
        .assert_for_room("room-en")
        .assert_for_identity(TEST_AUDIENCE_ID)
        .assert_can_publish(false)
        .assert_expires_in(21_600);

    Ok(())
}

#[tokio::test]
async fn test_publisher_flag_controls_publish_grant() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;

    for (flag, expected) in [("true", true), ("1", true), ("false", false), ("0", false)] {
        let response = TokenRequest::new("room-vn", TEST_INTERPRETER_VN_ID)
            .publisher_raw(flag)
            .send(&server.url())
            .await?;

        response
            .token
            .assert_for_room("room-vn")
            .assert_can_publish(expected);
    }

    Ok(())
}

#[tokio::test]
async fn test_named_interpreter_publishes() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;

    let response = TokenRequest::new("room-kr", TEST_NAMED_INTERPRETER_ID)
        .publisher(true)
        .send(&server.url())
        .await?;

    response
        .token
        .assert_for_identity(TEST_NAMED_INTERPRETER_ID)
        .assert_can_publish(true);

    Ok(())
}

/// Menu `kr` resolves to `room-kr` and an audience identity is admitted.
#[tokio::test]
async fn test_korean_listener_scenario() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;

    let language = Language::from_menu_code("kr")?;
    let room = language.room_name();
    let identity = Identity::audience_now();

    let response = TokenRequest::new(room.as_str(), identity.as_str())
        .send(&server.url())
        .await?;

    assert_eq!(response.room, "room-kr");
    assert!(response.identity.starts_with("audience-"));
    response.token.assert_for_room("room-kr");
    assert_eq!(language.title_zh(), "韩语");
    assert_eq!(language.title_en(), "Korean");

    Ok(())
}

#[tokio::test]
async fn test_identical_requests_yield_distinct_tokens() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;
    let request = TokenRequest::new("room-id", TEST_AUDIENCE_ID);

    let first = request.send(&server.url()).await?;
    let second = request.send(&server.url()).await?;

    assert_ne!(first.token, second.token);
    assert!(decode_test_token(&first.token).equivalent_to(&decode_test_token(&second.token)));

    Ok(())
}

#[tokio::test]
async fn test_unconventional_room_is_accepted() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;

    let response = TokenRequest::new("room-test", "test-user")
        .publisher(true)
        .send(&server.url())
        .await?;

    response.token.assert_for_room("room-test");

    Ok(())
}

#[tokio::test]
async fn test_token_ttl_follows_config() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn_with_vars(HashMap::from([(
        "TOKEN_TTL_SECONDS".to_string(),
        "900".to_string(),
    )]))
    .await?;

    let response = TokenRequest::new("room-en", TEST_AUDIENCE_ID)
        .send(&server.url())
        .await?;

    response.token.assert_expires_in(900);

    Ok(())
}

// ============================================================================
// Rejections
// ============================================================================

async fn assert_bad_request(server: &TestTokenServer, request: TokenRequest) -> Result<(), anyhow::Error> {
    let response = request.send_raw(&server.url()).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"].is_string());
    assert!(body.get("token").is_none(), "No token may be minted");

    Ok(())
}

#[tokio::test]
async fn test_missing_room_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;
    assert_bad_request(
        &server,
        TokenRequest::new("room-en", TEST_AUDIENCE_ID).without_room(),
    )
    .await
}

#[tokio::test]
async fn test_missing_identity_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;
    assert_bad_request(
        &server,
        TokenRequest::new("room-en", TEST_AUDIENCE_ID).without_identity(),
    )
    .await
}

#[tokio::test]
async fn test_empty_parameters_are_rejected() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;
    assert_bad_request(&server, TokenRequest::empty()).await?;
    assert_bad_request(&server, TokenRequest::new("", TEST_AUDIENCE_ID)).await?;
    assert_bad_request(&server, TokenRequest::new("room-en", "")).await
}

#[tokio::test]
async fn test_invalid_publisher_flag_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;
    assert_bad_request(
        &server,
        TokenRequest::new("room-en", TEST_AUDIENCE_ID).publisher_raw("yes"),
    )
    .await
}
