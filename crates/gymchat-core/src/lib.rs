//! Gymchat Core - fitness assistant orchestration
//!
//! This crate provides the core functionality for the gymchat
//! assistant:
//! - Tool system: fitness tools and remote (MCP-served) tools
//! - Tool registry and schema-validating executor
//! - Append-only chat session transcript
//! - Orchestrator loop between the model backend and the tools
//! - Model backend abstraction over the genai framework

pub mod config;
pub mod error;
pub mod orchestration;
pub mod provider;
pub mod tools;

pub use config::Config;
pub use error::{Error, Result, ToolError};
pub use orchestration::{
    CancelHandle, ChatMessage, ChatSession, Orchestrator, OrchestratorConfig, Role, ToolExecutor,
    ToolResultRecord,
};
pub use provider::{GenAiBackend, ModelBackend, ModelTurn, ToolCall};
pub use tools::api::FitnessApi;
pub use tools::{fitness_registry, validate_arguments, Tool, ToolDefinition, ToolOutput, ToolRegistry};
