//! Model backend abstraction
//!
//! The orchestrator only depends on this contract: it hands over the
//! transcript and the tool catalog, and gets back either a final
//! answer or one or more tool call requests. The production backend
//! (`GenAiBackend`) talks to Groq and friends through the genai
//! framework; tests script their own implementations.

mod genai_backend;

pub use genai_backend::GenAiBackend;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::orchestration::ChatMessage;
use crate::tools::ToolDefinition;

/// A tool call requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back with the result
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// Arguments as a JSON object
    pub arguments: serde_json::Value,
}

/// One model response: a final answer, tool call requests, or both
#[derive(Debug, Clone, Default)]
pub struct ModelTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ModelTurn {
    /// A turn with neither text nor tool calls is malformed and is
    /// treated as a backend failure by the orchestrator
    pub fn is_empty(&self) -> bool {
        self.tool_calls.is_empty() && self.content.as_deref().is_none_or(str::is_empty)
    }

    pub fn final_answer(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_request(calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls: calls,
        }
    }
}

/// Trait for model backends
#[async_trait::async_trait]
pub trait ModelBackend: Send + Sync {
    /// Backend name for logging (e.g., "groq")
    fn name(&self) -> &str;

    /// Run one completion over the transcript with the tool catalog
    async fn complete(
        &self,
        transcript: &[ChatMessage],
        catalog: &[ToolDefinition],
    ) -> Result<ModelTurn>;
}
