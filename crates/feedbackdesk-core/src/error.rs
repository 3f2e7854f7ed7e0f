use thiserror::Error;

/// Errors produced by the assistant core.
///
/// Heuristic parse misses are not errors: they surface as `Ok(None)` from the
/// planners. Everything here is scoped to a single requested action.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Neither the primary nor the legacy secret yielded a usable API key.
    #[error("no API credential is configured")]
    CredentialUnavailable,

    /// Every attempt through the managed proxy failed.
    #[error("{endpoint} is unavailable: {message}")]
    UpstreamUnavailable { endpoint: String, message: String },

    /// Both the proxied and the direct transcription paths failed.
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),

    /// No teacher matched the requested name, even fuzzily.
    #[error("no teacher found matching \"{0}\"")]
    TeacherNotFound(String),

    /// Both the privileged function and the privileged procedure failed.
    #[error("failed to create observation: {0}")]
    ObservationCreateFailed(String),

    /// The language model reply did not describe a valid action.
    #[error("malformed intent: {0}")]
    MalformedIntent(String),

    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A remote HTTP endpoint answered with a non-success status.
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The data platform rejected a read or a write.
    #[error("data store error: {0}")]
    Store(String),

    /// An HTTP request failed before a status was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to serialize or deserialize JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
