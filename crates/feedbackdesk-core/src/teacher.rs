//! Teacher assistant: intent planning, transcription and the turn handler.
//!
//! Planning runs the local heuristic first and only asks the language model
//! when it finds nothing. Model calls go through the proxy function; the
//! direct provider path is used for transcription and free-form chat only,
//! never for planning.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::CoreConfig;
use crate::credential::{Credential, CredentialResolver};
use crate::error::AssistantError;
use crate::executor::ActionExecutor;
use crate::heuristic;
use crate::invoke::{InvocationClient, UpstreamApi};
use crate::protocol::{
    ChatCompletionRequest, CompletionMessage, HelperRequest, completion_content, decode_audio,
    normalize_audio_base64,
};
use crate::store::FunctionInvoker;
use crate::types::{CurrentUser, ParsedAction};

const CHAT_PROMPT: &str = "You are a helpful assistant for teachers working with classroom \
observations. Answer briefly and practically.";

const CHAT_TEMPERATURE: f32 = 0.7;

pub struct TeacherAssistant {
    credentials: Arc<CredentialResolver>,
    proxy: InvocationClient,
    upstream: Arc<dyn UpstreamApi>,
    executor: ActionExecutor,
    helper_function: String,
    chat_model: String,
    transcribe_model: String,
}

impl TeacherAssistant {
    pub fn new(
        config: &CoreConfig,
        credentials: Arc<CredentialResolver>,
        functions: Arc<dyn FunctionInvoker>,
        upstream: Arc<dyn UpstreamApi>,
        executor: ActionExecutor,
    ) -> Self {
        Self {
            credentials,
            proxy: InvocationClient::new(functions, config.retry_base_delay),
            upstream,
            executor,
            helper_function: config.helper_function.clone(),
            chat_model: config.chat_model.clone(),
            transcribe_model: config.transcribe_model.clone(),
        }
    }

    /// Turn free text into an action, or `None` when it does not ask for one.
    ///
    /// Credential errors propagate. An unreachable proxy or an unusable model
    /// reply both mean "no action".
    pub async fn plan_action(
        &self,
        prompt: &str,
        user_name: Option<&str>,
    ) -> Result<Option<ParsedAction>, AssistantError> {
        if let Some(action) = heuristic::parse_local(prompt, user_name) {
            debug!(teacher = action.teacher_name(), "intent recognised locally");
            return Ok(Some(action));
        }

        let credential = self.credentials.ensure_credential().await?;
        let request = HelperRequest::Chat {
            model: Some(self.chat_model.clone()),
            messages: vec![
                CompletionMessage::system(planning_prompt(user_name, Local::now().date_naive())),
                CompletionMessage::user(prompt),
            ],
            temperature: Some(0.0),
            api_key: Some(credential.expose().to_owned()),
        };

        let completion = match self.proxy.invoke(&self.helper_function, &request).await {
            Ok(completion) => completion,
            Err(e @ AssistantError::UpstreamUnavailable { .. }) => {
                warn!(error = %e, "intent planning skipped");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match interpret_plan(&completion) {
            Ok(action) => {
                debug!(planned = action.is_some(), "intent planned by model");
                Ok(action)
            }
            Err(e) => {
                debug!(error = %e, "model reply ignored");
                Ok(None)
            }
        }
    }

    /// Transcribe base64 audio (a `data:` URL prefix is accepted).
    ///
    /// The proxy is tried first; the provider is called directly only when
    /// the proxy fails or replies without text.
    pub async fn transcribe_audio(&self, audio_base64: &str) -> Result<String, AssistantError> {
        let encoded = normalize_audio_base64(audio_base64);
        let audio = decode_audio(&encoded)?;

        let credential = self.credentials.ensure_credential().await?;
        let request = HelperRequest::Transcribe {
            audio_base64: Some(encoded),
            model: Some(self.transcribe_model.clone()),
            api_key: Some(credential.expose().to_owned()),
        };

        match self.proxy.invoke(&self.helper_function, &request).await {
            Ok(reply) => match reply.get("text").and_then(Value::as_str) {
                Some(text) => return Ok(text.to_owned()),
                None => warn!("proxy transcription reply has no text"),
            },
            Err(e) => warn!(error = %e, "proxy transcription failed, calling provider directly"),
        }

        self.upstream
            .transcribe(&credential, &self.transcribe_model, audio)
            .await
            .map_err(|e| AssistantError::TranscriptionFailed(e.to_string()))
    }

    /// Handle one conversation turn and return the assistant's reply.
    pub async fn reply(&self, prompt: &str, user: &CurrentUser) -> Result<String, AssistantError> {
        if let Some(action) = self.plan_action(prompt, user.name.as_deref()).await? {
            let created = self
                .executor
                .create_observation(action, user.id.as_deref())
                .await?;
            info!(teacher = %created.teacher_name, "assistant created observation");
            return Ok(format!(
                "Observation created for {} on {}.",
                created.teacher_name,
                created.date.with_timezone(&Local).format("%Y-%m-%d")
            ));
        }

        let credential = self.credentials.ensure_credential().await?;
        let request = ChatCompletionRequest {
            model: self.chat_model.clone(),
            messages: vec![CompletionMessage::system(CHAT_PROMPT), CompletionMessage::user(prompt)],
            temperature: CHAT_TEMPERATURE,
        };
        let completion = self.chat(&credential, request).await?;
        completion_content(&completion)
            .map(|content| content.trim().to_owned())
            .ok_or_else(|| AssistantError::Upstream {
                status: 502,
                message: "completion has no content".into(),
            })
    }

    /// Chat completion through the proxy, falling back to the provider.
    async fn chat(
        &self,
        credential: &Credential,
        request: ChatCompletionRequest,
    ) -> Result<Value, AssistantError> {
        let proxied = HelperRequest::Chat {
            model: Some(request.model.clone()),
            messages: request.messages.clone(),
            temperature: Some(request.temperature),
            api_key: Some(credential.expose().to_owned()),
        };
        match self.proxy.invoke(&self.helper_function, &proxied).await {
            Err(AssistantError::UpstreamUnavailable { message, .. }) => {
                warn!(error = %message, "proxy chat unavailable, calling provider directly");
                self.upstream.chat(credential, &request).await
            }
            other => other,
        }
    }
}

fn planning_prompt(user_name: Option<&str>, today: NaiveDate) -> String {
    let user = user_name.unwrap_or("unknown");
    format!(
        "You turn a teacher's request into one JSON value and output nothing else.\n\
         If the request asks to create an observation, assessment or evaluation, output \
         {{\"type\":\"create_observation\",\"teacher_name\":\"<full name>\",\
         \"subject\":\"<subject or null>\",\"date\":\"<YYYY-MM-DD or null>\"}}.\n\
         Otherwise output null.\n\
         The current user is {user}; requests about themselves use that name.\n\
         Today is {today}."
    )
}

/// Read a [`ParsedAction`] (or `null`) out of a chat completion.
fn interpret_plan(completion: &Value) -> Result<Option<ParsedAction>, AssistantError> {
    let content = completion_content(completion)
        .ok_or_else(|| AssistantError::MalformedIntent("completion has no content".into()))?;
    let body = strip_code_fences(content);
    if body.is_empty() || body == "null" {
        return Ok(None);
    }
    let action: Option<ParsedAction> =
        serde_json::from_str(body).map_err(|e| AssistantError::MalformedIntent(e.to_string()))?;
    match action {
        Some(action) if action.teacher_name().trim().is_empty() => {
            Err(AssistantError::MalformedIntent("empty teacher name".into()))
        }
        other => Ok(other),
    }
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

// ── Tests ──────────────────────────────────────────────────────────────────────
