//! Error types for Gymchat Core

use thiserror::Error;

/// Result type alias using Gymchat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Gymchat error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Model backend error: {0}")]
    Backend(String),

    #[error("Iteration limit of {0} reached without a final answer")]
    IterationLimit(usize),

    #[error("Conversation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Tool-specific errors
///
/// These are recoverable within a conversation: the orchestrator feeds
/// them back to the model as a tool result so it can correct itself.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid parameters for {tool}: {}", fields.join(", "))]
    InvalidParams { tool: String, fields: Vec<String> },

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Tool already registered: {0}")]
    AlreadyRegistered(String),
}

impl ToolError {
    /// Convenience constructor for a single violated field
    pub fn invalid_param(tool: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidParams {
            tool: tool.into(),
            fields: vec![field.into()],
        }
    }
}
