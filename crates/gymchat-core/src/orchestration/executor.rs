//! Tool executor
//!
//! Resolves a model-issued tool call against the registry, validates
//! its arguments against the declared schema, runs the handler, and
//! folds every failure mode into a result record. Nothing below this
//! layer ever reaches the loop as an unwrapped error.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ToolError;
use crate::provider::ToolCall;
use crate::tools::{validate_arguments, ToolRegistry};

/// Outcome of one tool execution, success or failure
#[derive(Debug, Clone)]
pub struct ToolResultRecord {
    /// Call id this record answers
    pub call_id: String,
    /// Tool name as requested by the model
    pub tool_name: String,
    pub success: bool,
    /// Handler payload on success, error detail on failure
    pub payload: String,
}

impl ToolResultRecord {
    fn ok(call: &ToolCall, payload: String) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: true,
            payload,
        }
    }

    fn err(call: &ToolCall, error: &ToolError) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: false,
            payload: format!("Error: {}", error),
        }
    }
}

/// Executes tool calls against a shared registry
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute one call
    ///
    /// Every failure (unknown tool, invalid arguments, handler error)
    /// comes back as an unsuccessful record so the orchestrator can
    /// feed it to the model as evidence.
    pub async fn execute(&self, call: &ToolCall) -> ToolResultRecord {
        let Some(tool) = self.registry.get(&call.name) else {
            warn!(tool = %call.name, "Unknown tool requested by model");
            return ToolResultRecord::err(call, &ToolError::NotFound(call.name.clone()));
        };

        if let Err(e) = validate_arguments(&tool.to_definition(), &call.arguments) {
            warn!(tool = %call.name, error = %e, "Tool arguments failed validation");
            return ToolResultRecord::err(call, &e);
        }

        debug!(tool = %call.name, "Executing tool");

        match tool.execute(call.arguments.clone()).await {
            Ok(output) => {
                // Payload is exactly what the handler produced
                let payload = match output.content {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                ToolResultRecord::ok(call, payload)
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                ToolResultRecord::err(call, &e)
            }
        }
    }
}
