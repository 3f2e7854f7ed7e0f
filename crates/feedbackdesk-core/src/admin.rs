//! Admin assistant: a small fixed command grammar.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::info;

use crate::error::AssistantError;
use crate::store::DataStore;

static CREATE_SUBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^create subject\s+(.+)$").expect("valid regex"));

static CREATE_OBSERVATION_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^create observation type\s+(.+)$").expect("valid regex"));

static GRANT_ADMIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:make admin|grant admin to)\s+(\S+)$").expect("valid regex")
});

pub const HELP: &str = "I can help with:\n\
    • \"create subject <name>\" to add a subject\n\
    • \"create observation type <name>\" to add an observation type\n\
    • \"make admin <email>\" or \"grant admin to <email>\" to look up a teacher for admin access";

/// Interprets administrative commands and applies them to the store.
pub struct AdminAssistant {
    store: Arc<dyn DataStore>,
}

impl AdminAssistant {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Run one command and return the reply text.
    ///
    /// Store errors propagate unchanged; the caller renders them.
    pub async fn process(&self, input: &str) -> Result<String, AssistantError> {
        let command = input.trim().to_lowercase();

        if let Some(caps) = CREATE_SUBJECT.captures(&command) {
            let name = title_case(&caps[1]);
            self.store.create_subject(&name).await?;
            info!(subject = %name, "subject created");
            return Ok(format!("Subject \"{name}\" created successfully."));
        }

        if let Some(caps) = CREATE_OBSERVATION_TYPE.captures(&command) {
            let name = title_case(&caps[1]);
            self.store.create_observation_type(&name).await?;
            info!(observation_type = %name, "observation type created");
            return Ok(format!("Observation type \"{name}\" created successfully."));
        }

        if let Some(caps) = GRANT_ADMIN.captures(&command) {
            let email = caps[1].trim_end_matches(['.', ',', '!', '?']);
            // Elevation stays a deliberate UI action; this only confirms the account.
            return Ok(match self.store.find_teacher_by_email(email).await? {
                None => format!("No teacher found with email {email}."),
                Some(teacher) => format!(
                    "Found {} ({email}). To grant admin access, open Teachers, select them and use \"Make admin\".",
                    teacher.name
                ),
            });
        }

        Ok(HELP.to_owned())
    }
}

/// Upper-case the first letter of every whitespace-separated word.
pub fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::MemoryStore;

    fn assistant(store: &Arc<MemoryStore>) -> AdminAssistant {
        AdminAssistant::new(store.clone())
    }

    #[tokio::test]
    async fn create_subject_title_cases_name() {
        let store = Arc::new(MemoryStore::default());
        let reply = assistant(&store)
            .process("  Create Subject physics and chemistry ")
            .await
            .unwrap();
        assert_eq!(reply, "Subject \"Physics And Chemistry\" created successfully.");
        assert_eq!(*store.subjects.lock().unwrap(), vec!["Physics And Chemistry"]);
    }

    #[tokio::test]
    async fn create_observation_type() {
        let store = Arc::new(MemoryStore::default());
        let reply = assistant(&store)
            .process("create observation type learning walk")
            .await
            .unwrap();
        assert_eq!(reply, "Observation type \"Learning Walk\" created successfully.");
        assert_eq!(*store.observation_types.lock().unwrap(), vec!["Learning Walk"]);
        assert!(store.subjects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn grant_admin_unknown_email() {
        let store = Arc::new(MemoryStore::with_teachers([("Sam Bishop", "sam@school.org")]));
        let reply = assistant(&store)
            .process("grant admin to nobody@school.org")
            .await
            .unwrap();
        assert_eq!(reply, "No teacher found with email nobody@school.org.");
    }

    #[tokio::test]
    async fn make_admin_known_email_does_not_mutate() {
        let store = Arc::new(MemoryStore::with_teachers([("Sam Bishop", "Sam@School.org")]));
        let reply = assistant(&store).process("make admin sam@school.org").await.unwrap();
        assert!(reply.starts_with("Found Sam Bishop (sam@school.org)."), "{reply}");
        assert!(store.procedure_calls.lock().unwrap().is_empty());
        assert!(store.feedback.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_command_returns_help() {
        let store = Arc::new(MemoryStore::default());
        let reply = assistant(&store).process("delete everything").await.unwrap();
        assert_eq!(reply, HELP);
        assert!(reply.contains("create subject <name>"));
        assert!(reply.contains("create observation type <name>"));
        assert!(reply.contains("grant admin to <email>"));
    }

    #[tokio::test]
    async fn store_errors_propagate() {
        let store = Arc::new(MemoryStore::default().failing_writes());
        let err = assistant(&store).process("create subject art").await.unwrap_err();
        assert!(matches!(err, AssistantError::Store(_)));
    }

    #[test]
    fn title_case_collapses_spacing() {
        assert_eq!(title_case("physics   and chemistry"), "Physics And Chemistry");
        assert_eq!(title_case("élan vital"), "Élan Vital");
    }
}
