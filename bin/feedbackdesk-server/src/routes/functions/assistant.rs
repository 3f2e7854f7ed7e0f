//! `assistant`: one conversation turn with the admin or teacher assistant.
//!
//! Failures of the requested action are part of the conversation: they come
//! back as an apology reply with status 200. Only an unusable request is an
//! HTTP error.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use feedbackdesk_core::protocol::{AssistantKind, AssistantReply, AssistantRequest};
use feedbackdesk_core::types::ChatMessage;
use feedbackdesk_core::{AssistantError, Conversation, CurrentUser};
use tracing::{info, warn};
use utoipa::OpenApi;

use super::{parse_body, preflight};
use crate::error::ServerError;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(assistant),
    components(schemas(AssistantRequest, AssistantKind, AssistantReply, ChatMessage))
)]
pub struct AssistantApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/assistant", post(assistant).options(preflight))
}

#[utoipa::path(
    post,
    path = "/functions/v1/assistant",
    tag = "functions",
    request_body = AssistantRequest,
    responses(
        (status = 200, description = "Assistant reply", body = AssistantReply),
        (status = 400, description = "Empty request or undecodable audio"),
    )
)]
pub async fn assistant(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<AssistantReply>, ServerError> {
    let request: AssistantRequest = parse_body(&body)?;
    let mut conversation = Conversation::new();

    let text = match (request.kind, request.audio_base64.as_deref()) {
        (AssistantKind::Teacher, Some(audio)) if request.text.trim().is_empty() => {
            match state.teacher.transcribe_audio(audio).await {
                Ok(text) => text,
                Err(e @ AssistantError::BadRequest(_)) => return Err(e.into()),
                Err(e) => {
                    warn!(kind = ?request.kind, error = %e, "transcription failed");
                    let reply = conversation.record_reply(Err(e)).content.clone();
                    return Ok(Json(AssistantReply {
                        reply,
                        messages: conversation.messages().to_vec(),
                    }));
                }
            }
        }
        _ => request.text.trim().to_owned(),
    };
    if text.trim().is_empty() {
        return Err(ServerError::BadRequest("text is required".into()));
    }

    conversation.record_user(text.as_str());

    let outcome = match request.kind {
        AssistantKind::Admin => state.admin.process(&text).await,
        AssistantKind::Teacher => {
            let user = CurrentUser { id: request.observer_id, name: request.user_name };
            state.teacher.reply(&text, &user).await
        }
    };
    match &outcome {
        Ok(_) => info!(kind = ?request.kind, "assistant turn completed"),
        Err(e) => warn!(kind = ?request.kind, error = %e, "assistant turn failed"),
    }

    let reply = conversation.record_reply(outcome).content.clone();
    Ok(Json(AssistantReply { reply, messages: conversation.messages().to_vec() }))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use crate::routes::testkit::{Kit, post_json};
    use axum::http::StatusCode;
    use feedbackdesk_core::testing::{FakeUpstream, ScriptedInvoker, StaticSecrets};
    use serde_json::json;

    const PATH: &str = "/functions/v1/assistant";

    #[tokio::test]
    async fn admin_creates_subject() {
        let kit = Kit::new();
        let (status, body) =
            post_json(kit.app(), PATH, json!({ "kind": "admin", "text": "create subject music" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Subject \"Music\" created successfully.");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][1]["role"], "assistant");
        assert_eq!(*kit.store.subjects.lock().unwrap(), vec!["Music"]);
    }

    #[tokio::test]
    async fn teacher_creates_observation_locally() {
        let kit = Kit::new()
            .with_functions(ScriptedInvoker::default().replying(json!({ "feedback": { "id": "x" } })));
        let (status, body) = post_json(
            kit.app(),
            PATH,
            json!({
                "kind": "teacher",
                "text": "create a self assessment for 25/12/2024",
                "user_name": "Sam Bishop",
                "observer_id": "t-2",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Observation created for Sam Bishop on 2024-12-25.");

        let calls = kit.functions.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "create-feedback");
        assert_eq!(calls[0].1["observer_id"], "t-2");
    }

    #[tokio::test]
    async fn failures_become_apologies() {
        let kit = Kit::new();
        let (status, body) = post_json(
            kit.app(),
            PATH,
            json!({ "kind": "teacher", "text": "create an observation for Maria Lopes" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["reply"],
            "Sorry, I couldn't complete that: no teacher found matching \"Maria Lopes\""
        );
    }

    #[tokio::test]
    async fn teacher_audio_is_transcribed_first() {
        let kit = Kit::new()
            .with_upstream(FakeUpstream::default().transcribing("create subject art"))
            .with_functions(
                ScriptedInvoker::default()
                    .failing_once("proxy down")
                    .failing_once("proxy down")
                    .replying(json!({ "choices": [{ "message": { "content": "null" } }] }))
                    .replying(json!({ "choices": [{ "message": { "content": "Noted." } }] })),
            );
        let (status, body) = post_json(
            kit.app(),
            PATH,
            json!({ "kind": "teacher", "audio_base64": "data:audio/webm;base64,AAEC" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"][0]["content"], "create subject art");
        assert_eq!(body["reply"], "Noted.");
        assert_eq!(kit.upstream.transcribe_count(), 1);
    }

    #[tokio::test]
    async fn empty_text_is_400() {
        let (status, body) =
            post_json(Kit::new().app(), PATH, json!({ "kind": "admin", "text": "  " })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "text is required");
    }

    #[tokio::test]
    async fn invalid_audio_is_400() {
        let (status, _) = post_json(
            Kit::new().app(),
            PATH,
            json!({ "kind": "teacher", "audio_base64": "%%%" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn failed_transcription_is_an_apology() {
        let kit = Kit::new();
        let (status, body) = post_json(
            kit.app(),
            PATH,
            json!({ "kind": "teacher", "audio_base64": "AAEC" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["reply"],
            "Sorry, I couldn't complete that: transcription failed: upstream returned 502: upstream unreachable"
        );
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "assistant");
    }

    #[tokio::test]
    async fn missing_credential_during_transcription_is_an_apology() {
        let kit = Kit::new().with_secrets(StaticSecrets::default());
        let (status, body) = post_json(
            kit.app(),
            PATH,
            json!({ "kind": "teacher", "audio_base64": "AAEC" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["reply"],
            "Sorry, I couldn't complete that: no API credential is configured"
        );
    }
}
