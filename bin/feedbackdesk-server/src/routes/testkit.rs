//! Router harness for route tests: the real router over in-memory fakes.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use feedbackdesk_core::testing::{FakeUpstream, MemoryStore, ScriptedInvoker, StaticSecrets};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::config::Config;
use crate::routes;
use crate::state::{AppState, Collaborators};

pub struct Kit {
    pub store: Arc<MemoryStore>,
    pub secrets: Arc<StaticSecrets>,
    pub functions: Arc<ScriptedInvoker>,
    pub upstream: Arc<FakeUpstream>,
    pub config: Config,
}

impl Kit {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.core.retry_base_delay = Duration::ZERO;
        Self {
            store: Arc::new(MemoryStore::with_teachers([
                ("Samantha Oliveira", "samantha@school.org"),
                ("Sam Bishop", "sam@school.org"),
            ])),
            secrets: Arc::new(StaticSecrets::default().with("OPENAI_CREATE", "sk-test")),
            functions: Arc::new(ScriptedInvoker::default()),
            upstream: Arc::new(FakeUpstream::default()),
            config,
        }
    }

    pub fn with_store(mut self, store: MemoryStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn with_secrets(mut self, secrets: StaticSecrets) -> Self {
        self.secrets = Arc::new(secrets);
        self
    }

    pub fn with_functions(mut self, functions: ScriptedInvoker) -> Self {
        self.functions = Arc::new(functions);
        self
    }

    pub fn with_upstream(mut self, upstream: FakeUpstream) -> Self {
        self.upstream = Arc::new(upstream);
        self
    }

    pub fn with_config(mut self, edit: impl FnOnce(&mut Config)) -> Self {
        edit(&mut self.config);
        self
    }

    pub fn app(&self) -> Router {
        let state = AppState::with_collaborators(
            self.config.clone(),
            Collaborators {
                store: self.store.clone(),
                secrets: self.secrets.clone(),
                functions: self.functions.clone(),
                upstream: self.upstream.clone(),
            },
        );
        routes::build(Arc::new(state))
    }
}

pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, headers, bytes)
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, _, bytes) = send(app, req).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, HeaderMap, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, headers, bytes) = send(app, req).await;
    (status, headers, serde_json::from_slice(&bytes).unwrap())
}
