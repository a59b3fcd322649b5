//! Conversation history kept by the orchestrator

use serde::{Deserialize, Serialize};

use crate::stream::{AccumulatedMessage, Source};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
}

/// A finished message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            sources: Vec::new(),
        }
    }

    pub fn agent(message: AccumulatedMessage) -> Self {
        Self {
            role: Role::Agent,
            text: message.text,
            sources: message.sources,
        }
    }
}
