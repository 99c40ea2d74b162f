// src/message.rs
use serde::{Deserialize, Serialize};

/// Most recent history entries carried as context (six exchanges).
pub const HISTORY_WINDOW: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<Message>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub reply: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Tail of `entries` no longer than [`HISTORY_WINDOW`], oldest first.
pub fn recent<T>(entries: &[T]) -> &[T] {
    let start = entries.len().saturating_sub(HISTORY_WINDOW);
    &entries[start..]
}
