//! MCP server implementation
//!
//! Dispatches `initialize`, `tools/list` and `tools/call` requests to
//! a handler and can serve a whole session over stdio.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::protocol::{methods, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
use crate::{McpTool, ServerCapabilities, ToolsCapability, PROTOCOL_VERSION};

/// Handler for MCP tool requests
#[async_trait::async_trait]
pub trait McpHandler: Send + Sync {
    /// List available tools
    async fn list_tools(&self) -> Vec<McpTool>;

    /// Call a tool with already-parsed arguments
    ///
    /// `Err` is a tool-level failure: it is reported to the client as
    /// a result with `isError: true`, not as a protocol error.
    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, String>;
}

/// MCP server
pub struct McpServer<H: McpHandler> {
    handler: Arc<H>,
    capabilities: ServerCapabilities,
    server_name: String,
    server_version: String,
}

impl<H: McpHandler> McpServer<H> {
    pub fn new(handler: Arc<H>) -> Self {
        Self {
            handler,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_name: "gymchat".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    /// Handle a JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(request.id).await,
            methods::TOOLS_LIST => self.handle_tools_list(request.id).await,
            methods::TOOLS_CALL => self.handle_tools_call(request.id, request.params).await,
            _ => JsonRpcResponse::error(request.id, JsonRpcError::method_not_found()),
        }
    }

    /// Serve requests over stdin/stdout until EOF
    ///
    /// Messages are newline-delimited JSON. Notifications (messages
    /// without an id, such as `notifications/initialized`) are
    /// accepted and ignored.
    pub async fn run_stdio(&self) -> std::io::Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(stdin).lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let value: serde_json::Value = match serde_json::from_str(&line) {
                Ok(v) => v,
                Err(e) => {
                    warn!("Discarding unparseable message: {}", e);
                    let resp = JsonRpcResponse::error(
                        RequestId::Number(0),
                        JsonRpcError::parse_error(),
                    );
                    Self::write_response(&mut stdout, &resp).await?;
                    continue;
                }
            };

            // Notifications carry no id and get no response
            if value.get("id").is_none() {
                debug!(method = ?value.get("method"), "Received notification");
                continue;
            }

            let response = match serde_json::from_value::<JsonRpcRequest>(value) {
                Ok(request) => {
                    debug!(method = %request.method, "Handling request");
                    self.handle_request(request).await
                }
                Err(e) => {
                    warn!("Malformed request: {}", e);
                    JsonRpcResponse::error(RequestId::Number(0), JsonRpcError::parse_error())
                }
            };

            Self::write_response(&mut stdout, &response).await?;
        }

        Ok(())
    }

    async fn write_response(
        stdout: &mut tokio::io::Stdout,
        response: &JsonRpcResponse,
    ) -> std::io::Result<()> {
        let json = serde_json::to_string(response)?;
        stdout.write_all(json.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await
    }

    async fn handle_initialize(&self, id: RequestId) -> JsonRpcResponse {
        let result = serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": self.capabilities,
            "serverInfo": {
                "name": self.server_name,
                "version": self.server_version
            }
        });

        JsonRpcResponse::success(id, result)
    }

    async fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        let tools = self.handler.list_tools().await;
        JsonRpcResponse::success(id, serde_json::json!({ "tools": tools }))
    }

    async fn handle_tools_call(
        &self,
        id: RequestId,
        params: Option<serde_json::Value>,
    ) -> JsonRpcResponse {
        let params = match params {
            Some(p) => p,
            None => return JsonRpcResponse::error(id, JsonRpcError::invalid_params()),
        };

        let name = match params.get("name").and_then(|v| v.as_str()) {
            Some(n) => n,
            None => return JsonRpcResponse::error(id, JsonRpcError::invalid_params()),
        };

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or(serde_json::Value::Object(Default::default()));

        match self.handler.call_tool(name, arguments).await {
            Ok(result) => {
                let content = vec![serde_json::json!({
                    "type": "text",
                    "text": result.to_string()
                })];
                JsonRpcResponse::success(
                    id,
                    serde_json::json!({
                        "content": content,
                        "isError": false
                    }),
                )
            }
            Err(e) => {
                let content = vec![serde_json::json!({
                    "type": "text",
                    "text": e
                })];
                JsonRpcResponse::success(
                    id,
                    serde_json::json!({
                        "content": content,
                        "isError": true
                    }),
                )
            }
        }
    }
}
