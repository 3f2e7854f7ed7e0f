//! Command interpreter behind the feedbackdesk assistants.
//!
//! The admin assistant maps a fixed command grammar onto store writes. The
//! teacher assistant turns free text (or transcribed audio) into a
//! [`ParsedAction`] and hands it to the [`ActionExecutor`]. Every remote
//! collaborator sits behind a trait in [`store`] or [`invoke`].

pub mod admin;
pub mod config;
pub mod credential;
pub mod error;
pub mod executor;
pub mod fuzzy;
pub mod heuristic;
pub mod invoke;
pub mod protocol;
pub mod rest;
pub mod session;
pub mod store;
pub mod teacher;
pub mod types;
pub mod upstream;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use admin::AdminAssistant;
pub use config::CoreConfig;
pub use credential::{Credential, CredentialResolver};
pub use error::AssistantError;
pub use executor::ActionExecutor;
pub use invoke::{InvocationClient, UpstreamApi};
pub use rest::RestStore;
pub use session::{Conversation, apology};
pub use store::{DataStore, FunctionInvoker, SecretSource};
pub use teacher::TeacherAssistant;
pub use types::{ChatMessage, CurrentUser, ObservationCreated, ParsedAction, Role, Teacher};
pub use upstream::OpenAiClient;
