//! Client/server loopback tests over an in-memory transport

use std::sync::Arc;

use gymchat_mcp::protocol::JsonRpcRequest;
use gymchat_mcp::transport::ChannelTransport;
use gymchat_mcp::{ClientInfo, McpClient, McpHandler, McpServer, McpTool, Transport};

struct FormCueHandler;

#[async_trait::async_trait]
impl McpHandler for FormCueHandler {
    async fn list_tools(&self) -> Vec<McpTool> {
        vec![McpTool {
            name: "exercise_details".to_string(),
            description: "Look up form cues for an exercise".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "exercise_name": { "type": "string" }
                },
                "required": ["exercise_name"]
            }),
        }]
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, String> {
        match name {
            "exercise_details" => {
                let exercise = arguments["exercise_name"].as_str().unwrap_or("unknown");
                Ok(serde_json::json!({
                    "exercise": exercise,
                    "cues": ["neutral spine", "knees track over toes"]
                }))
            }
            other => Err(format!("Unknown tool: {}", other)),
        }
    }
}

/// Pump requests from the server-side transport through the server
fn serve(server: McpServer<FormCueHandler>, mut transport: ChannelTransport) {
    tokio::spawn(async move {
        while let Ok(Some(value)) = transport.receive().await {
            // Skip notifications (no id)
            if value.get("id").is_none() {
                continue;
            }
            let request: JsonRpcRequest = match serde_json::from_value(value) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let response = server.handle_request(request).await;
            let value = serde_json::to_value(&response).expect("serialize response");
            if transport.send(value).await.is_err() {
                break;
            }
        }
    });
}

fn client_info() -> ClientInfo {
    ClientInfo {
        name: "gymchat-test".to_string(),
        version: "0.0.0".to_string(),
    }
}

#[tokio::test]
async fn handshake_then_list_and_call() {
    let (client_side, server_side) = ChannelTransport::pair();
    serve(
        McpServer::new(Arc::new(FormCueHandler)).with_name("gym-tools"),
        server_side,
    );

    let mut client = McpClient::new(client_side);
    let info = client.initialize(client_info()).await.unwrap();
    assert_eq!(info.name, "gym-tools");

    let tools = client.list_tools().await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "exercise_details");

    let result = client
        .call_tool(
            "exercise_details",
            serde_json::json!({"exercise_name": "squat"}),
        )
        .await
        .unwrap();
    assert!(!result.is_error);
    assert!(result.text().contains("neutral spine"));
}

#[tokio::test]
async fn unknown_tool_is_an_error_result_not_a_transport_failure() {
    let (client_side, server_side) = ChannelTransport::pair();
    serve(McpServer::new(Arc::new(FormCueHandler)), server_side);

    let mut client = McpClient::new(client_side);
    client.initialize(client_info()).await.unwrap();

    let result = client
        .call_tool("unknown_tool", serde_json::json!({}))
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.text().contains("Unknown tool"));
}
