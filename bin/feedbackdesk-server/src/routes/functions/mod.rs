//! Serverless function routes, nested under `/functions/v1`.
//!
//! Bodies are read as raw bytes and decoded here so a malformed body becomes
//! a `{error}` 400 like every other validation failure.

pub mod assistant;
pub mod create_feedback;
pub mod teacher_helper;

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use serde::de::DeserializeOwned;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(teacher_helper::router())
        .merge(create_feedback::router())
        .merge(assistant::router())
}

#[derive(OpenApi)]
#[openapi()]
pub struct FunctionsApi;

pub fn api_docs() -> utoipa::openapi::OpenApi {
    let mut spec = FunctionsApi::openapi();
    spec.merge(teacher_helper::TeacherHelperApi::openapi());
    spec.merge(create_feedback::CreateFeedbackApi::openapi());
    spec.merge(assistant::AssistantApi::openapi());
    spec
}

/// Plain `OPTIONS` answer for clients that probe without CORS headers.
pub async fn preflight() -> &'static str {
    "ok"
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ServerError> {
    serde_json::from_slice(body)
        .map_err(|e| ServerError::BadRequest(format!("invalid request body: {e}")))
}
