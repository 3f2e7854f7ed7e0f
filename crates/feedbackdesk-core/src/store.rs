//! Seams to the hosted data platform.
//!
//! The assistants never talk to the platform directly; they go through these
//! traits so the platform can be swapped or faked. [`crate::rest::RestStore`]
//! implements all three against the platform's REST conventions.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AssistantError;
use crate::protocol::FeedbackInput;
use crate::types::Teacher;

/// Named secret lookup.
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Returns `Ok(None)` when the secret does not exist.
    async fn secret(&self, name: &str) -> Result<Option<String>, AssistantError>;
}

/// Invocation of a named serverless function with a JSON body.
#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    async fn invoke_function(&self, name: &str, body: &Value) -> Result<Value, AssistantError>;
}

/// Table reads/writes and privileged procedures used by the assistants.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn create_subject(&self, name: &str) -> Result<(), AssistantError>;

    async fn create_observation_type(&self, name: &str) -> Result<(), AssistantError>;

    /// Exact (case-insensitive) email match.
    async fn find_teacher_by_email(&self, email: &str) -> Result<Option<Teacher>, AssistantError>;

    /// Case-insensitive partial match on the teacher name.
    async fn find_teachers_by_name(&self, fragment: &str) -> Result<Vec<Teacher>, AssistantError>;

    /// Every teacher, ordered by name.
    async fn list_teachers(&self) -> Result<Vec<Teacher>, AssistantError>;

    /// Insert an observation row and return it as stored.
    async fn insert_feedback(&self, input: &FeedbackInput) -> Result<Value, AssistantError>;

    /// Call a privileged stored procedure with named parameters.
    async fn call_procedure(&self, name: &str, params: &Value) -> Result<Value, AssistantError>;
}
