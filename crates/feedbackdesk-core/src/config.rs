//! Core configuration, loaded from environment variables.

use std::time::Duration;

/// Settings shared by the assistants and the REST adapter.
///
/// Every field has a default so tests and local runs need no environment.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Base URL of the hosted data platform, e.g. `https://xyz.example.co`.
    pub store_url: String,
    /// Key sent as `apikey` and bearer token to the platform.
    pub store_key: String,
    /// Base URL of the upstream model provider.
    pub openai_base: String,
    pub chat_model: String,
    pub transcribe_model: String,
    /// Proxy function mediating calls to the model provider.
    pub helper_function: String,
    /// Privileged function creating observation records.
    pub feedback_function: String,
    /// Privileged procedure used when the feedback function fails.
    pub create_procedure: String,
    /// Secret holding the provider key.
    pub primary_secret: String,
    /// Older secret name, consulted when the primary one is empty.
    pub legacy_secret: String,
    /// Delay unit between proxy attempts; attempt `n` waits `n × delay`.
    pub retry_base_delay: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            store_url: "http://localhost:54321".into(),
            store_key: String::new(),
            openai_base: "https://api.openai.com".into(),
            chat_model: "gpt-4o-mini".into(),
            transcribe_model: "whisper-1".into(),
            helper_function: "teacher-helper".into(),
            feedback_function: "create-feedback".into(),
            create_procedure: "create_observation_admin".into(),
            primary_secret: "OPENAI_CREATE".into(),
            legacy_secret: "OPENAI_FEEDBACK".into(),
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl CoreConfig {
    /// Build [`CoreConfig`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            store_url: env_or("FEEDBACKDESK_STORE_URL", &defaults.store_url),
            store_key: env_or("FEEDBACKDESK_STORE_KEY", &defaults.store_key),
            openai_base: env_or("FEEDBACKDESK_OPENAI_BASE", &defaults.openai_base),
            chat_model: env_or("FEEDBACKDESK_CHAT_MODEL", &defaults.chat_model),
            transcribe_model: env_or("FEEDBACKDESK_TRANSCRIBE_MODEL", &defaults.transcribe_model),
            helper_function: env_or("FEEDBACKDESK_HELPER_FUNCTION", &defaults.helper_function),
            feedback_function: env_or("FEEDBACKDESK_FEEDBACK_FUNCTION", &defaults.feedback_function),
            create_procedure: env_or("FEEDBACKDESK_CREATE_PROCEDURE", &defaults.create_procedure),
            primary_secret: env_or("FEEDBACKDESK_PRIMARY_SECRET", &defaults.primary_secret),
            legacy_secret: env_or("FEEDBACKDESK_LEGACY_SECRET", &defaults.legacy_secret),
            retry_base_delay: Duration::from_millis(parse_env("FEEDBACKDESK_RETRY_DELAY_MS", 500)),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
