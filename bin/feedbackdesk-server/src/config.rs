//! Server configuration, loaded from environment variables at startup.

use feedbackdesk_core::CoreConfig;

/// Runtime configuration for feedbackdesk-server.
///
/// Every field has a sensible default so the server starts without any
/// environment variables set; the functions that need a key fail per request
/// until one is provided.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Serve the OpenAPI document at `/api-docs/openapi.json`.
    pub enable_docs: bool,

    /// Privileged platform key used for writes and secret lookups. Falls back
    /// to the core store key when unset.
    pub service_key: Option<String>,

    /// Provider key used by `teacher-helper` when a request carries none.
    pub openai_api_key: Option<String>,

    /// Settings shared with the assistant core.
    pub core: CoreConfig,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("FEEDBACKDESK_BIND", "0.0.0.0:3000"),
            log_level: env_or("FEEDBACKDESK_LOG", "info"),
            log_json: env_flag("FEEDBACKDESK_LOG_JSON", false),
            enable_docs: env_flag("FEEDBACKDESK_ENABLE_DOCS", true),
            service_key: env_opt("FEEDBACKDESK_SERVICE_KEY"),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            core: CoreConfig::from_env(),
        }
    }

    /// The key the server uses towards the data platform.
    pub fn platform_key(&self) -> &str {
        self.service_key.as_deref().unwrap_or(&self.core.store_key)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".into(),
            log_level: "info".into(),
            log_json: false,
            enable_docs: true,
            service_key: None,
            openai_api_key: None,
            core: CoreConfig::default(),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}
