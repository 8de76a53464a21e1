//! Token service error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl.
//! Client-facing messages for server faults are generic; the underlying
//! error is logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Token service error type.
///
/// Maps to HTTP status codes:
/// - BadRequest: 400 Bad Request
/// - Signing: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum TsError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Signing error: {0}")]
    Signing(String),
}

impl TsError {
    /// Bounded label for metrics.
    pub fn category(&self) -> &'static str {
        match self {
            TsError::BadRequest(_) => "validation",
            TsError::Signing(_) => "signing",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for TsError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            TsError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", reason.clone())
            }
            TsError::Signing(err) => {
                tracing::error!(target: "token_service.crypto", error = %err, "Token signing failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SIGNING_ERROR",
                    "Failed to generate token".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_display() {
        assert_eq!(
            TsError::BadRequest("missing room".to_string()).to_string(),
            "Bad request: missing room"
        );
        assert_eq!(
            TsError::Signing("bad key".to_string()).to_string(),
            "Signing error: bad key"
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(TsError::BadRequest(String::new()).category(), "validation");
        assert_eq!(TsError::Signing(String::new()).category(), "signing");
    }

    #[tokio::test]
    async fn test_bad_request_response_body() {
        let response =
            TsError::BadRequest("Missing required parameter: room".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert_eq!(body["error"]["message"], "Missing required parameter: room");
    }

    #[tokio::test]
    async fn test_signing_error_hides_details() {
        let response = TsError::Signing("InvalidKeyFormat".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"]["code"], "SIGNING_ERROR");
        assert!(!body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("InvalidKeyFormat"));
    }
}
