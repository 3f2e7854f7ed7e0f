//! In-memory conversation history for one assistant panel.

use crate::error::AssistantError;
use crate::types::{ChatMessage, Role};

/// Render an error as the assistant's reply.
pub fn apology(error: &AssistantError) -> String {
    format!("Sorry, I couldn't complete that: {error}")
}

/// Ordered turns of a conversation. Lives only as long as its owner.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an assistant greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self { messages: vec![ChatMessage::assistant(greeting)] }
    }

    pub fn record_user(&mut self, content: impl Into<String>) -> &ChatMessage {
        self.push(ChatMessage::user(content))
    }

    /// Append the outcome of a turn; errors become an apology.
    pub fn record_reply(&mut self, outcome: Result<String, AssistantError>) -> &ChatMessage {
        let content = match outcome {
            Ok(reply) => reply,
            Err(e) => apology(&e),
        };
        self.push(ChatMessage::assistant(content))
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last_reply(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        let last = self.messages.len() - 1;
        &self.messages[last]
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
