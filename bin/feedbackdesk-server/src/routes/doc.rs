use axum::Json;
use utoipa::OpenApi;

use crate::routes::{functions, health};

#[derive(OpenApi)]
#[openapi(info(
    title = "feedbackdesk-server",
    description = "Serverless functions behind the feedbackdesk assistants",
    version = "0.1.0"
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(functions::api_docs());
    root
}

/// `GET /api-docs/openapi.json`
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(get_docs())
}
