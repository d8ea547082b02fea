//! Chat session transcript
//!
//! The transcript is the conversation's append-only log. Insertion
//! order is causal order: the model always sees history exactly as it
//! happened, and past tool results stay as evidence for later turns.
//! Only the orchestrator pushes messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::ToolCall;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    ToolResult,
}

/// A message in the chat session
///
/// Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Tool calls issued by an assistant message
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tool_calls: Vec<ToolCall>,
    /// Call id a tool-result message answers
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tool_call_id: Option<String>,
    /// Whether a tool-result message carries an error
    #[serde(default)]
    pub is_error: bool,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>, is_error: bool) -> Self {
        Self {
            role: Role::ToolResult,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
            is_error,
            timestamp: Utc::now(),
        }
    }
}

/// One conversation's transcript plus its loop iteration counter
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    iterations: usize,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the end of the transcript
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Read-only view of the transcript in insertion order
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Completed model/tool round-trips in the current turn
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn bump_iterations(&mut self) {
        self.iterations += 1;
    }

    /// Reset the iteration counter at the start of a user turn
    pub fn reset_iterations(&mut self) {
        self.iterations = 0;
    }

    /// Drop the whole history (caller-facing `clear` command)
    pub fn clear(&mut self) {
        self.messages.clear();
        self.iterations = 0;
    }
}
