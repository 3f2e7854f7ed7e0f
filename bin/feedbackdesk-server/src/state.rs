//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use feedbackdesk_core::{
    ActionExecutor, AdminAssistant, AssistantError, CredentialResolver, DataStore,
    FunctionInvoker, OpenAiClient, RestStore, SecretSource, TeacherAssistant, UpstreamApi,
};

use crate::config::Config;

/// State shared across all HTTP handlers.
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Platform tables, accessed with the service key.
    pub store: Arc<dyn DataStore>,
    /// Direct provider client used by `teacher-helper`.
    pub upstream: Arc<dyn UpstreamApi>,
    pub admin: Arc<AdminAssistant>,
    pub teacher: Arc<TeacherAssistant>,
}

/// The remote collaborators the assistants are wired to.
pub struct Collaborators {
    pub store: Arc<dyn DataStore>,
    pub secrets: Arc<dyn SecretSource>,
    pub functions: Arc<dyn FunctionInvoker>,
    pub upstream: Arc<dyn UpstreamApi>,
}

impl AppState {
    /// Wire the assistants against the hosted platform and the provider.
    pub fn from_config(config: Config) -> Result<Self, AssistantError> {
        let platform = Arc::new(RestStore::from_config(&config.core)?.with_key(config.platform_key()));
        let upstream = Arc::new(OpenAiClient::new(config.core.openai_base.clone())?);
        Ok(Self::with_collaborators(
            config,
            Collaborators {
                store: platform.clone(),
                secrets: platform.clone(),
                functions: platform,
                upstream,
            },
        ))
    }

    pub fn with_collaborators(config: Config, deps: Collaborators) -> Self {
        let core = &config.core;
        let credentials = Arc::new(CredentialResolver::from_config(deps.secrets, core));
        let executor = ActionExecutor::new(deps.store.clone(), deps.functions.clone(), core);
        let teacher = TeacherAssistant::new(
            core,
            credentials,
            deps.functions,
            deps.upstream.clone(),
            executor,
        );
        Self {
            admin: Arc::new(AdminAssistant::new(deps.store.clone())),
            teacher: Arc::new(teacher),
            store: deps.store,
            upstream: deps.upstream,
            config: Arc::new(config),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn from_config_builds_http_clients() {
        assert!(AppState::from_config(Config::default()).is_ok());
    }

    #[test]
    fn from_config_rejects_invalid_store_url() {
        let mut config = Config::default();
        config.core.store_url = "not a url".into();
        let err = AppState::from_config(config).err().unwrap();
        assert!(matches!(err, AssistantError::BadRequest(_)));
    }
}
