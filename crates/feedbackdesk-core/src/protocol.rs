//! Wire schemas for the serverless functions.
//!
//! The same types are used by the core when calling the functions and by
//! `feedbackdesk-server` when serving them, so both ends agree on the shape.
//! Requests are tagged by `mode` / `kind` and validated on receipt instead of
//! being duck-typed.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::AssistantError;
use crate::types::ChatMessage;

/// One message in an upstream chat-completion conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CompletionMessage {
    /// `"system"`, `"user"` or `"assistant"`.
    pub role: String,
    pub content: String,
}

impl CompletionMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

/// Body of the upstream `POST /v1/chat/completions` call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<CompletionMessage>,
    pub temperature: f32,
}

/// Request body of the `teacher-helper` proxy function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HelperRequest {
    Chat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(default)]
        messages: Vec<CompletionMessage>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temperature: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
    },
    Transcribe {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        audio_base64: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
    },
}

impl HelperRequest {
    /// Check the fields each mode requires. The API key is checked separately
    /// because the server may supply its own.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            HelperRequest::Chat { messages, .. } if messages.is_empty() => {
                Err("messages are required in chat mode".into())
            }
            HelperRequest::Transcribe { audio_base64, .. }
                if audio_base64.as_deref().is_none_or(|a| a.trim().is_empty()) =>
            {
                Err("audio_base64 is required in transcribe mode".into())
            }
            _ => Ok(()),
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        match self {
            HelperRequest::Chat { api_key, .. } | HelperRequest::Transcribe { api_key, .. } => {
                api_key.as_deref().filter(|k| !k.trim().is_empty())
            }
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            HelperRequest::Chat { .. } => "chat",
            HelperRequest::Transcribe { .. } => "transcribe",
        }
    }
}

/// Reply of the `teacher-helper` function in transcribe mode.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TranscriptionReply {
    pub text: String,
}

/// Request body of the `create-feedback` function.
///
/// `teacher_id` is optional at the type level so a missing id can be reported
/// as a 400 instead of a decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FeedbackInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl FeedbackInput {
    pub fn teacher_id(&self) -> Option<&str> {
        self.teacher_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// Reply of the `create-feedback` function.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeedbackCreated {
    #[schema(value_type = Object)]
    pub feedback: Value,
}

/// Which assistant should handle an `assistant` function call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssistantKind {
    Admin,
    Teacher,
}

/// Request body of the `assistant` function.
///
/// Teacher requests may carry recorded audio instead of text; it is
/// transcribed before planning.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssistantRequest {
    pub kind: AssistantKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub audio_base64: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub observer_id: Option<String>,
}

/// Reply of the `assistant` function: the reply text plus the two turns to
/// append to the caller's conversation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssistantReply {
    pub reply: String,
    pub messages: Vec<ChatMessage>,
}

/// Extract `choices[0].message.content` from a chat-completion object.
pub fn completion_content(completion: &Value) -> Option<&str> {
    completion
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
}

/// The `{error}` message a function put in an otherwise successful reply.
pub fn reply_error(reply: &Value) -> Option<String> {
    match reply.get("error") {
        None | Some(Value::Null) => None,
        Some(Value::String(message)) => Some(message.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// Drop a `data:<mime>;base64,` prefix and any whitespace from recorded audio.
pub fn normalize_audio_base64(input: &str) -> String {
    let payload = match input.trim().split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => input,
    };
    payload.split_whitespace().collect()
}

/// Decode normalized base64 audio; empty or invalid input is a bad request.
pub fn decode_audio(encoded: &str) -> Result<Vec<u8>, AssistantError> {
    let audio = BASE64
        .decode(encoded)
        .map_err(|e| AssistantError::BadRequest(format!("invalid audio encoding: {e}")))?;
    if audio.is_empty() {
        return Err(AssistantError::BadRequest("audio is empty".into()));
    }
    Ok(audio)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
