//! Remote tool wrapper
//!
//! Bridges tools served by an MCP server into the local registry.
//! Each server-side tool is wrapped as a `Tool` implementation whose
//! execute forwards a `tools/call` request through a shared client.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use gymchat_mcp::{McpClient, McpTool, Transport};

use crate::error::ToolError;
use crate::tools::{Tool, ToolOutput};

/// A tool that lives in a remote MCP server
pub struct RemoteTool<T: Transport> {
    info: McpTool,
    client: Arc<McpClient<T>>,
}

impl<T: Transport> RemoteTool<T> {
    pub fn new(info: McpTool, client: Arc<McpClient<T>>) -> Self {
        Self { info, client }
    }
}

#[async_trait::async_trait]
impl<T: Transport + 'static> Tool for RemoteTool<T> {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn description(&self) -> &str {
        &self.info.description
    }

    fn parameters_schema(&self) -> Value {
        self.info.input_schema.clone()
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        debug!(tool = %self.info.name, "Forwarding call to MCP server");

        let result = self
            .client
            .call_tool(&self.info.name, params)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("MCP call failed: {}", e)))?;

        let text = result.text();
        if result.is_error {
            return Err(ToolError::ExecutionFailed(if text.is_empty() {
                "Remote tool execution failed".to_string()
            } else {
                text
            }));
        }

        // Servers send JSON payloads as text content; surface them as
        // structured values when they parse
        let content = serde_json::from_str::<Value>(&text)
            .unwrap_or(Value::String(text));

        Ok(ToolOutput::new(content))
    }
}

/// Wrap every tool advertised by a server into local `Tool`s
pub async fn discover_remote_tools<T: Transport + 'static>(
    client: Arc<McpClient<T>>,
) -> Result<Vec<Arc<dyn Tool>>, ToolError> {
    let tools = client
        .list_tools()
        .await
        .map_err(|e| ToolError::ExecutionFailed(format!("tools/list failed: {}", e)))?;

    debug!(count = tools.len(), "Discovered remote tools");

    Ok(tools
        .into_iter()
        .map(|info| Arc::new(RemoteTool::new(info, client.clone())) as Arc<dyn Tool>)
        .collect())
}
