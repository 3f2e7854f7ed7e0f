//! Remote invocation: proxy first, direct upstream as the caller's fallback.
//!
//! [`InvocationClient`] sends requests through the managed proxy function with
//! a bounded retry. When every attempt fails it returns
//! [`AssistantError::UpstreamUnavailable`] and the caller decides whether to
//! reach the provider directly through an [`UpstreamApi`]. The order never
//! inverts: the proxy holds the trusted path, the direct call is a last resort.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::credential::Credential;
use crate::error::AssistantError;
use crate::protocol::{ChatCompletionRequest, HelperRequest, reply_error};
use crate::store::FunctionInvoker;

/// Total number of proxy attempts per invocation.
pub const PROXY_ATTEMPTS: u32 = 2;

/// Direct calls to the model provider.
#[async_trait]
pub trait UpstreamApi: Send + Sync {
    /// Chat completion; returns the provider's completion object unchanged.
    async fn chat(
        &self,
        credential: &Credential,
        request: &ChatCompletionRequest,
    ) -> Result<Value, AssistantError>;

    /// Speech-to-text for one audio clip.
    async fn transcribe(
        &self,
        credential: &Credential,
        model: &str,
        audio: Vec<u8>,
    ) -> Result<String, AssistantError>;
}

/// Proxy client with linear back-off between attempts.
pub struct InvocationClient {
    invoker: Arc<dyn FunctionInvoker>,
    base_delay: Duration,
}

impl InvocationClient {
    pub fn new(invoker: Arc<dyn FunctionInvoker>, base_delay: Duration) -> Self {
        Self { invoker, base_delay }
    }

    /// Invoke `endpoint` with `payload`, retrying once.
    ///
    /// Attempt `n` (0-based) waits `n × base_delay` first. A reply that
    /// carries an `error` field counts as a failed attempt.
    pub async fn invoke(
        &self,
        endpoint: &str,
        payload: &HelperRequest,
    ) -> Result<Value, AssistantError> {
        let body = serde_json::to_value(payload)?;
        let mut last_err: Option<AssistantError> = None;

        for attempt in 0..PROXY_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(self.base_delay * attempt).await;
            }
            match self.invoke_once(endpoint, &body).await {
                Ok(reply) => {
                    debug!(endpoint, mode = payload.mode(), attempt = attempt + 1, "proxy invocation succeeded");
                    return Ok(reply);
                }
                Err(e) => {
                    warn!(endpoint, mode = payload.mode(), attempt = attempt + 1, error = %e, "proxy invocation failed");
                    last_err = Some(e);
                }
            }
        }

        Err(AssistantError::UpstreamUnavailable {
            endpoint: endpoint.to_owned(),
            message: last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt was made".to_owned()),
        })
    }

    async fn invoke_once(&self, endpoint: &str, body: &Value) -> Result<Value, AssistantError> {
        let reply = self.invoker.invoke_function(endpoint, body).await?;
        if let Some(message) = reply_error(&reply) {
            return Err(AssistantError::Upstream { status: 500, message });
        }
        Ok(reply)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
