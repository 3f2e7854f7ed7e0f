//! `create-feedback`: privileged observation insert.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use feedbackdesk_core::executor::DRAFT_STATUS;
use feedbackdesk_core::protocol::{FeedbackCreated, FeedbackInput};
use tracing::info;
use utoipa::OpenApi;

use super::{parse_body, preflight};
use crate::error::ServerError;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(create_feedback), components(schemas(FeedbackInput, FeedbackCreated)))]
pub struct CreateFeedbackApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/create-feedback", post(create_feedback).options(preflight))
}

/// Insert an observation with the service key.
///
/// `observation_date` defaults to now and `status` to `draft`.
#[utoipa::path(
    post,
    path = "/functions/v1/create-feedback",
    tag = "functions",
    request_body = FeedbackInput,
    responses(
        (status = 200, description = "Observation stored", body = FeedbackCreated),
        (status = 400, description = "teacher_id is required"),
        (status = 500, description = "Store error"),
    )
)]
pub async fn create_feedback(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<FeedbackCreated>, ServerError> {
    let mut input: FeedbackInput = parse_body(&body)?;
    let teacher_id = input
        .teacher_id()
        .map(str::to_owned)
        .ok_or_else(|| ServerError::BadRequest("teacher_id is required".into()))?;

    input.observation_date.get_or_insert_with(Utc::now);
    input.status.get_or_insert_with(|| DRAFT_STATUS.to_owned());

    let feedback = state.store.insert_feedback(&input).await?;
    info!(teacher_id = %teacher_id, "feedback created");
    Ok(Json(FeedbackCreated { feedback }))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use crate::routes::testkit::{Kit, post_json};
    use axum::http::StatusCode;
    use feedbackdesk_core::testing::MemoryStore;
    use serde_json::json;

    const PATH: &str = "/functions/v1/create-feedback";

    #[tokio::test]
    async fn stores_observation_with_defaults() {
        let kit = Kit::new();
        let (status, body) =
            post_json(kit.app(), PATH, json!({ "teacher_id": "t-2", "subject": "Physics" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["feedback"]["id"], "obs-1");
        assert_eq!(body["feedback"]["teacher_id"], "t-2");
        assert_eq!(body["feedback"]["status"], "draft");
        assert!(body["feedback"]["observation_date"].is_string());

        let rows = kit.store.feedback.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].subject.as_deref(), Some("Physics"));
    }

    #[tokio::test]
    async fn explicit_status_is_kept() {
        let kit = Kit::new();
        let (status, body) =
            post_json(kit.app(), PATH, json!({ "teacher_id": "t-2", "status": "completed" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["feedback"]["status"], "completed");
    }

    #[tokio::test]
    async fn missing_teacher_id_is_400() {
        let kit = Kit::new();
        let (status, body) = post_json(kit.app(), PATH, json!({ "subject": "Physics" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "teacher_id is required" }));

        let (status, _) = post_json(kit.app(), PATH, json!({ "teacher_id": "" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(kit.store.feedback.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_is_500() {
        let kit = Kit::new().with_store(MemoryStore::default().failing_writes());
        let (status, body) = post_json(kit.app(), PATH, json!({ "teacher_id": "t-1" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "data store error: permission denied");
    }
}
