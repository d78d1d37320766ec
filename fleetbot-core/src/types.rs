//! Core types: conversation messages and per-chat session state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a conversation message, one-to-one with the `role` values stored in
/// session history and sent to AI providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction (default or per-user custom prompt).
    System,
    /// Message from the chat user.
    User,
    /// Message produced by the AI assistant.
    Assistant,
}

/// A single conversation message. Serializes to the `{"role": ..., "content": ...}`
/// shape persisted in session history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Default system instruction when a user has not set a custom prompt for a bot.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Per-chat session state. `Idle` is the initial state for any chat; `AwaitingPrompt`
/// means the next freeform text is interpreted as a custom prompt until the state expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingPrompt,
}

impl SessionState {
    /// The string stored in the `chat_sessions.state` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingPrompt => "awaiting_prompt",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionState {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(SessionState::Idle),
            "awaiting_prompt" => Ok(SessionState::AwaitingPrompt),
            other => Err(crate::error::CoreError::InvalidState(other.to_string())),
        }
    }
}
