//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors become a JSON `{error}` body
//! with an appropriate status code.
//!
//! Transport and decoding failures are logged with full detail but only a
//! generic message is returned, so URLs and payloads never reach clients.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use feedbackdesk_core::AssistantError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// All errors that can occur in the feedbackdesk-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Propagated from the assistant core or the platform adapter.
    #[error(transparent)]
    Assistant(#[from] AssistantError),

    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::Assistant(AssistantError::BadRequest(m)) => {
                (StatusCode::BAD_REQUEST, m.clone())
            }
            ServerError::Assistant(e @ (AssistantError::Http(_) | AssistantError::Json(_))) => {
                error!(error = %e, "upstream transport error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "upstream request failed".to_owned(),
                )
            }
            ServerError::Assistant(e) => {
                error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn render(err: ServerError) -> (StatusCode, Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn bad_request_keeps_message() {
        let (status, body) = render(ServerError::BadRequest("teacher_id is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "teacher_id is required");
    }

    #[tokio::test]
    async fn core_bad_request_is_400() {
        let (status, body) =
            render(AssistantError::BadRequest("audio is empty".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "audio is empty");
    }

    #[tokio::test]
    async fn upstream_failure_is_500_with_reason() {
        let (status, body) = render(
            AssistantError::Upstream { status: 401, message: "invalid api key".into() }.into(),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "upstream returned 401: invalid api key");
    }
}
