//! Integration tests for the operational endpoints.

use reqwest::StatusCode;
use ts_test_utils::{TestTokenServer, TokenRequest, TEST_AUDIENCE_ID};

/// `/health` returns 200 OK as long as the process serves HTTP.
#[tokio::test]
async fn test_health_endpoint_returns_ok() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestTokenServer::spawn().await?;

    // Act
    let response = reqwest::get(format!("{}/health", server.url())).await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");

    Ok(())
}

/// `/metrics` is reachable after a token has been issued.
#[tokio::test]
async fn test_metrics_endpoint_is_served() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;

    TokenRequest::new("room-en", TEST_AUDIENCE_ID)
        .send(&server.url())
        .await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;
    assert_eq!(response.status(), StatusCode::OK);
    // Series content is covered by the router tests; only the first server
    // in a test process owns the global recorder.
    assert!(response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .is_some());

    Ok(())
}

/// Unknown paths are 404.
#[tokio::test]
async fn test_unknown_path_is_not_found() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;

    let response = reqwest::get(format!("{}/rooms/room-en", server.url())).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}
