//! Provider credential resolution.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::config::CoreConfig;
use crate::error::AssistantError;
use crate::store::SecretSource;

/// An upstream API key. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Resolves the provider key from the secret store once and keeps it for the
/// lifetime of the resolver.
///
/// The cache is never invalidated: a key that later fails authentication
/// stays cached until the process restarts. Concurrent cold-cache callers may
/// each perform the lookups; the first value stored wins.
pub struct CredentialResolver {
    source: Arc<dyn SecretSource>,
    primary: String,
    legacy: String,
    cached: OnceLock<Credential>,
}

impl CredentialResolver {
    pub fn new(
        source: Arc<dyn SecretSource>,
        primary: impl Into<String>,
        legacy: impl Into<String>,
    ) -> Self {
        Self {
            source,
            primary: primary.into(),
            legacy: legacy.into(),
            cached: OnceLock::new(),
        }
    }

    pub fn from_config(source: Arc<dyn SecretSource>, config: &CoreConfig) -> Self {
        Self::new(source, &config.primary_secret, &config.legacy_secret)
    }

    /// Return the cached credential, resolving it on first use.
    ///
    /// Tries the primary secret, then the legacy one. An empty value and a
    /// lookup error are treated alike.
    pub async fn ensure_credential(&self) -> Result<Credential, AssistantError> {
        if let Some(credential) = self.cached.get() {
            return Ok(credential.clone());
        }

        for name in [&self.primary, &self.legacy] {
            match self.source.secret(name).await {
                Ok(Some(value)) if !value.trim().is_empty() => {
                    debug!(secret = %name, "credential resolved");
                    let credential = Credential::new(value.trim());
                    // Losing the race is fine; return whatever was stored first.
                    let _ = self.cached.set(credential.clone());
                    return Ok(self.cached.get().cloned().unwrap_or(credential));
                }
                Ok(_) => debug!(secret = %name, "secret is empty or missing"),
                Err(e) => warn!(secret = %name, error = %e, "secret lookup failed"),
            }
        }

        warn!(primary = %self.primary, legacy = %self.legacy, "no credential available");
        Err(AssistantError::CredentialUnavailable)
    }

    /// `true` once a credential has been cached.
    pub fn is_resolved(&self) -> bool {
        self.cached.get().is_some()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
