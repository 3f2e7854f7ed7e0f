//! `teacher-helper`: proxy to the model provider.
//!
//! The dashboard and the teacher assistant reach the provider through this
//! function so the provider key can stay server-side.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use feedbackdesk_core::Credential;
use feedbackdesk_core::protocol::{
    ChatCompletionRequest, CompletionMessage, HelperRequest, TranscriptionReply, decode_audio,
    normalize_audio_base64,
};
use tracing::{debug, info};
use utoipa::OpenApi;

use super::{parse_body, preflight};
use crate::error::ServerError;
use crate::state::AppState;

const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(OpenApi)]
#[openapi(
    paths(teacher_helper),
    components(schemas(HelperRequest, CompletionMessage, TranscriptionReply))
)]
pub struct TeacherHelperApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/teacher-helper", post(teacher_helper).options(preflight))
}

/// Chat completion or transcription through the provider.
///
/// `mode: "chat"` returns the provider's completion object unchanged;
/// `mode: "transcribe"` returns `{text}`.
#[utoipa::path(
    post,
    path = "/functions/v1/teacher-helper",
    tag = "functions",
    request_body = HelperRequest,
    responses(
        (status = 200, description = "Completion or transcription"),
        (status = 400, description = "Missing api_key, messages or audio"),
        (status = 500, description = "Provider error"),
    )
)]
pub async fn teacher_helper(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ServerError> {
    let request: HelperRequest = parse_body(&body)?;
    request.validate().map_err(ServerError::BadRequest)?;

    let key = request
        .api_key()
        .map(str::to_owned)
        .or_else(|| state.config.openai_api_key.clone())
        .ok_or_else(|| ServerError::BadRequest("api_key is required".into()))?;
    let credential = Credential::new(key);
    let core = &state.config.core;

    match request {
        HelperRequest::Chat { model, messages, temperature, .. } => {
            let completion_request = ChatCompletionRequest {
                model: model.unwrap_or_else(|| core.chat_model.clone()),
                messages,
                temperature: temperature.unwrap_or(DEFAULT_TEMPERATURE),
            };
            debug!(
                model = %completion_request.model,
                messages = completion_request.messages.len(),
                "teacher-helper chat"
            );
            let completion = state.upstream.chat(&credential, &completion_request).await?;
            Ok(Json(completion).into_response())
        }
        HelperRequest::Transcribe { audio_base64, model, .. } => {
            let encoded = normalize_audio_base64(audio_base64.as_deref().unwrap_or_default());
            let audio = decode_audio(&encoded)?;
            let model = model.unwrap_or_else(|| core.transcribe_model.clone());
            info!(model = %model, size_bytes = audio.len(), "teacher-helper transcribe");
            let text = state.upstream.transcribe(&credential, &model, audio).await?;
            Ok(Json(TranscriptionReply { text }).into_response())
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use crate::routes::testkit::{Kit, post_json, send};
    use axum::http::{Method, Request, StatusCode};
    use feedbackdesk_core::testing::FakeUpstream;
    use serde_json::json;

    const PATH: &str = "/functions/v1/teacher-helper";

    #[tokio::test]
    async fn chat_passes_completion_through() {
        let kit = Kit::new().with_upstream(FakeUpstream::default().chatting("Hi there"));
        let (status, body) = post_json(
            kit.app(),
            PATH,
            json!({
                "mode": "chat",
                "api_key": "sk-client",
                "messages": [{ "role": "user", "content": "hello" }],
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["choices"][0]["message"]["content"], "Hi there");

        let calls = kit.upstream.chat_calls.lock().unwrap();
        assert_eq!(calls[0].model, "gpt-4o-mini");
        assert_eq!(calls[0].temperature, 0.7);
    }

    #[tokio::test]
    async fn transcribe_returns_text() {
        let kit = Kit::new().with_upstream(FakeUpstream::default().transcribing("observe Sam"));
        let (status, body) = post_json(
            kit.app(),
            PATH,
            json!({ "mode": "transcribe", "api_key": "sk-client", "audio_base64": "AAEC" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "text": "observe Sam" }));
        assert_eq!(kit.upstream.transcribe_count(), 1);
    }

    #[tokio::test]
    async fn missing_api_key_is_400() {
        let kit = Kit::new();
        let (status, body) = post_json(
            kit.app(),
            PATH,
            json!({ "mode": "chat", "messages": [{ "role": "user", "content": "hi" }] }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "api_key is required");
        assert_eq!(kit.upstream.chat_count(), 0);
    }

    #[tokio::test]
    async fn server_key_is_used_when_request_has_none() {
        let kit = Kit::new()
            .with_upstream(FakeUpstream::default().chatting("ok"))
            .with_config(|c| c.openai_api_key = Some("sk-server".into()));
        let (status, _) = post_json(
            kit.app(),
            PATH,
            json!({ "mode": "chat", "messages": [{ "role": "user", "content": "hi" }] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_messages_and_audio_are_400() {
        let kit = Kit::new();
        let (status, body) =
            post_json(kit.app(), PATH, json!({ "mode": "chat", "api_key": "sk" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "messages are required in chat mode");

        let (status, body) =
            post_json(kit.app(), PATH, json!({ "mode": "transcribe", "api_key": "sk" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "audio_base64 is required in transcribe mode");
    }

    #[tokio::test]
    async fn unknown_mode_is_400() {
        let (status, body) =
            post_json(Kit::new().app(), PATH, json!({ "mode": "image", "api_key": "sk" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("invalid request body"));
    }

    #[tokio::test]
    async fn provider_failure_is_500() {
        let (status, body) = post_json(
            Kit::new().app(),
            PATH,
            json!({
                "mode": "chat",
                "api_key": "sk",
                "messages": [{ "role": "user", "content": "hi" }],
            }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "upstream returned 502: upstream unreachable");
    }

    #[tokio::test]
    async fn options_answers_ok() {
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri(PATH)
            .body(axum::body::Body::empty())
            .unwrap();
        let (status, _, body) = send(Kit::new().app(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"ok");
    }
}
