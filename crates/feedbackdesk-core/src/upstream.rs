//! Direct HTTP client for the model provider.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::debug;

use crate::credential::Credential;
use crate::error::AssistantError;
use crate::invoke::UpstreamApi;
use crate::protocol::{ChatCompletionRequest, TranscriptionReply};

/// [`UpstreamApi`] over the provider's public REST API.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: String,
    client: Client,
}

impl OpenAiClient {
    /// `base_url` without a trailing `/v1`, e.g. `https://api.openai.com`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .user_agent(concat!("feedbackdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }
}

/// Turn a non-2xx response into [`AssistantError::Upstream`], keeping the
/// provider's message when it sent one.
pub(crate) async fn check_status(resp: Response) -> Result<Response, AssistantError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("message"))
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or(body);
    Err(AssistantError::Upstream { status: status.as_u16(), message })
}

#[async_trait]
impl UpstreamApi for OpenAiClient {
    async fn chat(
        &self,
        credential: &Credential,
        request: &ChatCompletionRequest,
    ) -> Result<Value, AssistantError> {
        debug!(model = %request.model, messages = request.messages.len(), "direct chat completion");
        let resp = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(credential.expose())
            .json(request)
            .send()
            .await?;
        Ok(check_status(resp).await?.json().await?)
    }

    async fn transcribe(
        &self,
        credential: &Credential,
        model: &str,
        audio: Vec<u8>,
    ) -> Result<String, AssistantError> {
        debug!(model, size_bytes = audio.len(), "direct transcription");
        let file = Part::bytes(audio)
            .file_name("audio.webm")
            .mime_str("audio/webm")?;
        let form = Form::new().part("file", file).text("model", model.to_owned());

        let resp = self
            .client
            .post(self.url("audio/transcriptions"))
            .bearer_auth(credential.expose())
            .multipart(form)
            .send()
            .await?;
        let reply: TranscriptionReply = check_status(resp).await?.json().await?;
        Ok(reply.text)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let client = OpenAiClient::new("https://api.openai.com/").unwrap();
        assert_eq!(
            client.url("chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }
}
