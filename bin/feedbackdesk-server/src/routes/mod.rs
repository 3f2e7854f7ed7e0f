//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - Health / heartbeat route
//! - Serverless function routes under `/functions/v1`
//! - Optional OpenAPI document (disable with `FEEDBACKDESK_ENABLE_DOCS=false`)

pub mod doc;
mod functions;
mod health;

#[cfg(test)]
pub(crate) mod testkit;

use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use tower::ServiceBuilder;

use crate::middleware::{cors, trace};
use crate::state::AppState;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .merge(health::router())
        .nest("/functions/v1", functions::router());

    if state.config.enable_docs {
        app = app.route("/api-docs/openapi.json", get(doc::openapi_json));
    }

    app
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer()))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}
