//! Executes parsed actions against the data platform.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::CoreConfig;
use crate::error::AssistantError;
use crate::fuzzy;
use crate::protocol::{FeedbackInput, reply_error};
use crate::store::{DataStore, FunctionInvoker};
use crate::types::{ObservationCreated, ParsedAction, Teacher};

/// Status given to observations created from the assistant.
pub const DRAFT_STATUS: &str = "draft";

pub struct ActionExecutor {
    store: Arc<dyn DataStore>,
    functions: Arc<dyn FunctionInvoker>,
    feedback_function: String,
    create_procedure: String,
}

impl ActionExecutor {
    pub fn new(
        store: Arc<dyn DataStore>,
        functions: Arc<dyn FunctionInvoker>,
        config: &CoreConfig,
    ) -> Self {
        Self {
            store,
            functions,
            feedback_function: config.feedback_function.clone(),
            create_procedure: config.create_procedure.clone(),
        }
    }

    /// Create the observation described by `action`.
    ///
    /// Takes the action by value: an action is executed at most once. The
    /// privileged procedure is tried only when the feedback function fails;
    /// neither path is retried.
    pub async fn create_observation(
        &self,
        action: ParsedAction,
        observer_id: Option<&str>,
    ) -> Result<ObservationCreated, AssistantError> {
        let ParsedAction::CreateObservation { teacher_name, subject, date } = action;
        let teacher = self.resolve_teacher(&teacher_name).await?;
        let date = date.unwrap_or_else(Utc::now);

        let input = FeedbackInput {
            teacher_id: Some(teacher.id.clone()),
            observer_id: observer_id.map(str::to_owned),
            observation_date: Some(date),
            status: Some(DRAFT_STATUS.to_owned()),
            subject: subject.clone(),
            ..FeedbackInput::default()
        };

        if let Err(function_err) = self.call_feedback_function(&input).await {
            warn!(teacher_id = %teacher.id, error = %function_err, "feedback function failed; using procedure");
            let params = json!({
                "p_teacher_id": teacher.id,
                "p_observer_id": observer_id,
                "p_observation_date": date,
                "p_status": DRAFT_STATUS,
                "p_subject": subject,
            });
            if let Err(procedure_err) = self.store.call_procedure(&self.create_procedure, &params).await {
                return Err(AssistantError::ObservationCreateFailed(format!(
                    "{function_err}; fallback procedure: {procedure_err}"
                )));
            }
        }

        info!(teacher_id = %teacher.id, date = %date, "observation created");
        Ok(ObservationCreated { teacher_name: teacher.name, date })
    }

    async fn call_feedback_function(&self, input: &FeedbackInput) -> Result<(), AssistantError> {
        let body = serde_json::to_value(input)?;
        let reply = self
            .functions
            .invoke_function(&self.feedback_function, &body)
            .await?;
        match reply_error(&reply) {
            Some(message) => Err(AssistantError::Upstream { status: 500, message }),
            None => Ok(()),
        }
    }

    /// Partial name match first; otherwise fuzzy scoring over all teachers.
    pub async fn resolve_teacher(&self, name: &str) -> Result<Teacher, AssistantError> {
        let name = name.trim();
        if let Some(teacher) = self.store.find_teachers_by_name(name).await?.into_iter().next() {
            debug!(requested = %name, resolved = %teacher.name, "teacher matched by name");
            return Ok(teacher);
        }

        let teachers = self.store.list_teachers().await?;
        match fuzzy::best_match(name, &teachers) {
            Some(teacher) => {
                debug!(requested = %name, resolved = %teacher.name, "teacher matched fuzzily");
                Ok(teacher.clone())
            }
            None => Err(AssistantError::TeacherNotFound(name.to_owned())),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
