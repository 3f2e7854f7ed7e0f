//! In-memory fakes of the store, secret, function and upstream seams.
//!
//! Compiled for this crate's tests and, with the `testing` feature, for the
//! tests of dependent crates.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::credential::Credential;
use crate::error::AssistantError;
use crate::invoke::UpstreamApi;
use crate::protocol::{ChatCompletionRequest, FeedbackInput};
use crate::store::{DataStore, FunctionInvoker, SecretSource};
use crate::types::Teacher;

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ── Secrets ──────────────────────────────────────────────────────────────────

/// Secret source backed by a map; records every lookup.
#[derive(Default)]
pub struct StaticSecrets {
    values: HashMap<String, String>,
    failing: HashSet<String>,
    lookups: Mutex<Vec<String>>,
}

impl StaticSecrets {
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_owned(), value.to_owned());
        self
    }

    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_owned());
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        lock(&self.lookups).clone()
    }
}

#[async_trait]
impl SecretSource for StaticSecrets {
    async fn secret(&self, name: &str) -> Result<Option<String>, AssistantError> {
        lock(&self.lookups).push(name.to_owned());
        if self.failing.contains(name) {
            return Err(AssistantError::Store(format!("secret {name} unreachable")));
        }
        Ok(self.values.get(name).cloned())
    }
}

// ── Functions ────────────────────────────────────────────────────────────────

/// Function invoker replaying scripted replies; once the script runs out every
/// call fails like an unreachable endpoint.
#[derive(Default)]
pub struct ScriptedInvoker {
    replies: Mutex<VecDeque<Result<Value, String>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedInvoker {
    pub fn replying(self, reply: Value) -> Self {
        lock(&self.replies).push_back(Ok(reply));
        self
    }

    pub fn failing_once(self, message: &str) -> Self {
        lock(&self.replies).push_back(Err(message.to_owned()));
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl FunctionInvoker for ScriptedInvoker {
    async fn invoke_function(&self, name: &str, body: &Value) -> Result<Value, AssistantError> {
        lock(&self.calls).push((name.to_owned(), body.clone()));
        match lock(&self.replies).pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(AssistantError::Upstream { status: 503, message }),
            None => Err(AssistantError::Upstream {
                status: 503,
                message: format!("function {name} unreachable"),
            }),
        }
    }
}

// ── Data store ───────────────────────────────────────────────────────────────

/// Table store held in memory.
#[derive(Default)]
pub struct MemoryStore {
    teachers: Vec<Teacher>,
    pub subjects: Mutex<Vec<String>>,
    pub observation_types: Mutex<Vec<String>>,
    pub feedback: Mutex<Vec<FeedbackInput>>,
    pub procedure_calls: Mutex<Vec<(String, Value)>>,
    pub partial_lookups: Mutex<Vec<String>>,
    fail_procedures: bool,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn with_teachers<'a>(names: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let teachers = names
            .into_iter()
            .enumerate()
            .map(|(i, (name, email))| Teacher {
                id: format!("t-{}", i + 1),
                name: name.to_owned(),
                email: Some(email.to_owned()),
            })
            .collect();
        Self { teachers, ..Self::default() }
    }

    pub fn failing_procedures(mut self) -> Self {
        self.fail_procedures = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    fn check_writable(&self) -> Result<(), AssistantError> {
        if self.fail_writes {
            return Err(AssistantError::Store("permission denied".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn create_subject(&self, name: &str) -> Result<(), AssistantError> {
        self.check_writable()?;
        lock(&self.subjects).push(name.to_owned());
        Ok(())
    }

    async fn create_observation_type(&self, name: &str) -> Result<(), AssistantError> {
        self.check_writable()?;
        lock(&self.observation_types).push(name.to_owned());
        Ok(())
    }

    async fn find_teacher_by_email(&self, email: &str) -> Result<Option<Teacher>, AssistantError> {
        Ok(self
            .teachers
            .iter()
            .find(|t| t.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)))
            .cloned())
    }

    async fn find_teachers_by_name(&self, fragment: &str) -> Result<Vec<Teacher>, AssistantError> {
        lock(&self.partial_lookups).push(fragment.to_owned());
        let needle = fragment.to_lowercase();
        Ok(self
            .teachers
            .iter()
            .filter(|t| t.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn list_teachers(&self) -> Result<Vec<Teacher>, AssistantError> {
        let mut teachers = self.teachers.clone();
        teachers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(teachers)
    }

    async fn insert_feedback(&self, input: &FeedbackInput) -> Result<Value, AssistantError> {
        self.check_writable()?;
        let mut rows = lock(&self.feedback);
        rows.push(input.clone());
        let mut record = serde_json::to_value(input)?;
        record["id"] = json!(format!("obs-{}", rows.len()));
        Ok(record)
    }

    async fn call_procedure(&self, name: &str, params: &Value) -> Result<Value, AssistantError> {
        lock(&self.procedure_calls).push((name.to_owned(), params.clone()));
        if self.fail_procedures {
            return Err(AssistantError::Store(format!("procedure {name} failed")));
        }
        Ok(json!({ "id": "obs-rpc" }))
    }
}

// ── Upstream ─────────────────────────────────────────────────────────────────

/// Direct-upstream fake with fixed outcomes and call counters.
pub struct FakeUpstream {
    chat_reply: Result<String, String>,
    transcription: Result<String, String>,
    pub chat_calls: Mutex<Vec<ChatCompletionRequest>>,
    pub transcribe_calls: Mutex<Vec<Vec<u8>>>,
}

impl Default for FakeUpstream {
    fn default() -> Self {
        Self {
            chat_reply: Err("upstream unreachable".into()),
            transcription: Err("upstream unreachable".into()),
            chat_calls: Mutex::new(Vec::new()),
            transcribe_calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeUpstream {
    pub fn chatting(mut self, reply: &str) -> Self {
        self.chat_reply = Ok(reply.to_owned());
        self
    }

    pub fn transcribing(mut self, text: &str) -> Self {
        self.transcription = Ok(text.to_owned());
        self
    }

    pub fn chat_count(&self) -> usize {
        lock(&self.chat_calls).len()
    }

    pub fn transcribe_count(&self) -> usize {
        lock(&self.transcribe_calls).len()
    }
}

#[async_trait]
impl UpstreamApi for FakeUpstream {
    async fn chat(
        &self,
        _credential: &Credential,
        request: &ChatCompletionRequest,
    ) -> Result<Value, AssistantError> {
        lock(&self.chat_calls).push(request.clone());
        match &self.chat_reply {
            Ok(content) => Ok(json!({
                "id": "chatcmpl-fake",
                "object": "chat.completion",
                "model": request.model,
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop",
                }],
            })),
            Err(message) => Err(AssistantError::Upstream { status: 502, message: message.clone() }),
        }
    }

    async fn transcribe(
        &self,
        _credential: &Credential,
        _model: &str,
        audio: Vec<u8>,
    ) -> Result<String, AssistantError> {
        lock(&self.transcribe_calls).push(audio);
        self.transcription
            .clone()
            .map_err(|message| AssistantError::Upstream { status: 502, message })
    }
}
