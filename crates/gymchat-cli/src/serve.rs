//! `gymchat serve` - the fitness tools as an MCP stdio server
//!
//! Bridges the local tool registry onto the MCP handler contract:
//! `tools/list` advertises the catalog, `tools/call` validates
//! arguments against the tool's schema and executes it. Tool failures
//! surface as `isError` results, never as protocol errors.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use gymchat_core::{fitness_registry, validate_arguments, Config, FitnessApi, ToolRegistry};
use gymchat_mcp::{McpHandler, McpServer, McpTool};

struct RegistryHandler {
    registry: ToolRegistry,
}

#[async_trait::async_trait]
impl McpHandler for RegistryHandler {
    async fn list_tools(&self) -> Vec<McpTool> {
        self.registry
            .catalog()
            .into_iter()
            .map(|def| McpTool {
                name: def.name,
                description: def.description,
                input_schema: def.parameters,
            })
            .collect()
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, String> {
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| format!("Tool not found: {}", name))?;

        validate_arguments(&tool.to_definition(), &arguments).map_err(|e| e.to_string())?;

        let output = tool.execute(arguments).await.map_err(|e| e.to_string())?;
        Ok(output.content)
    }
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    config.validate_for_serve()?;

    let api = FitnessApi::new(&config.fitness_api.base_url, &config.fitness_api_key()?)?;
    let registry = fitness_registry(api)?;
    info!(tools = registry.len(), "Starting fitness tool server");

    let server = McpServer::new(Arc::new(RegistryHandler { registry }));
    server.run_stdio().await?;

    Ok(())
}
