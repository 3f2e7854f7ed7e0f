use axum::http::{HeaderName, Method, header};
use tower_http::cors::{Any, CorsLayer};

/// Browser clients call the functions from any origin with the platform's
/// client headers.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
        .allow_methods([Method::POST, Method::OPTIONS])
}
