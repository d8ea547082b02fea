//! GenAI-based model backend
//!
//! Uses the genai framework with manual tool control, so the
//! orchestrator decides when and how tool calls are executed.

use std::time::Duration;

use futures::StreamExt;
use genai::chat::{ChatMessage, ChatRequest, ChatStreamEvent, Tool, ToolResponse};
use genai::resolver::{AuthData, AuthResolver};
use genai::Client;
use genai::WebConfig;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::orchestration::{self, Role};
use crate::provider::{ModelBackend, ModelTurn, ToolCall};
use crate::tools::ToolDefinition;

/// Default model, matching the original gym assistant deployment
pub const DEFAULT_MODEL: &str = "qwen-qwq-32b";

/// Production model backend on top of genai
pub struct GenAiBackend {
    client: Client,
    model: String,
    system_prompt: Option<String>,
}

impl GenAiBackend {
    /// Timeout for a single completion request
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

    fn web_config() -> WebConfig {
        WebConfig::default()
            .with_timeout(Self::REQUEST_TIMEOUT)
            .with_connect_timeout(Duration::from_secs(30))
    }

    /// Create a backend using environment variables for auth
    pub fn new(model: Option<&str>) -> Self {
        let client = Client::builder()
            .with_web_config(Self::web_config())
            .build();
        Self {
            client,
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            system_prompt: None,
        }
    }

    /// Create a backend with an explicit API key
    pub fn with_api_key(api_key: &str, model: Option<&str>) -> Self {
        let api_key = api_key.to_string();
        let auth_resolver = AuthResolver::from_resolver_fn(
            move |_model_iden| -> std::result::Result<Option<AuthData>, genai::resolver::Error> {
                Ok(Some(AuthData::from_single(api_key.clone())))
            },
        );

        let client = Client::builder()
            .with_web_config(Self::web_config())
            .with_auth_resolver(auth_resolver)
            .build();

        Self {
            client,
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            system_prompt: None,
        }
    }

    /// Set the system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Convert the session transcript into a genai chat request
    fn build_request(
        &self,
        transcript: &[orchestration::ChatMessage],
        catalog: &[ToolDefinition],
    ) -> ChatRequest {
        let mut req = ChatRequest::default();

        if let Some(system) = &self.system_prompt {
            req = req.with_system(system.as_str());
        }

        for msg in transcript {
            match msg.role {
                Role::User => {
                    req = req.append_message(ChatMessage::user(&msg.content));
                }
                Role::Assistant => {
                    if msg.tool_calls.is_empty() {
                        req = req.append_message(ChatMessage::assistant(&msg.content));
                    } else {
                        // Tool calls go out as a single assistant message
                        let calls: Vec<genai::chat::ToolCall> = msg
                            .tool_calls
                            .iter()
                            .map(|tc| genai::chat::ToolCall {
                                call_id: tc.id.clone(),
                                fn_name: tc.name.clone(),
                                fn_arguments: tc.arguments.clone(),
                                thought_signatures: None,
                            })
                            .collect();
                        req = req.append_message(calls);
                    }
                }
                Role::ToolResult => {
                    let call_id = msg.tool_call_id.clone().unwrap_or_default();
                    req = req.append_message(ToolResponse::new(call_id, msg.content.clone()));
                }
            }
        }

        if !catalog.is_empty() {
            let tools: Vec<Tool> = catalog
                .iter()
                .map(|t| {
                    Tool::new(&t.name)
                        .with_description(&t.description)
                        .with_schema(t.parameters.clone())
                })
                .collect();
            req = req.with_tools(tools);
        }

        req
    }
}

#[async_trait::async_trait]
impl ModelBackend for GenAiBackend {
    fn name(&self) -> &str {
        "genai"
    }

    async fn complete(
        &self,
        transcript: &[orchestration::ChatMessage],
        catalog: &[ToolDefinition],
    ) -> Result<ModelTurn> {
        let req = self.build_request(transcript, catalog);

        debug!(model = %self.model, messages = transcript.len(), "Model request");

        let stream_res = self
            .client
            .exec_chat_stream(&self.model, req, None)
            .await
            .map_err(|e| {
                error!(error = ?e, model = %self.model, "Model request failed");
                Error::Backend(format!("{:?}", e))
            })?;

        // Accumulate content and tool calls from the stream
        let mut content = String::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();
        let mut stream = stream_res.stream;

        while let Some(event) = stream.next().await {
            match event {
                Ok(ChatStreamEvent::Chunk(chunk)) => {
                    content.push_str(&chunk.content);
                }
                Ok(ChatStreamEvent::ReasoningChunk(_)) => {
                    // Reasoning traces are not part of the answer
                }
                Ok(ChatStreamEvent::ToolCallChunk(tc)) => {
                    let tool_call = tc.tool_call;
                    tool_calls.push(ToolCall {
                        id: tool_call.call_id,
                        name: tool_call.fn_name,
                        arguments: tool_call.fn_arguments,
                    });
                }
                Ok(ChatStreamEvent::End(_)) => {
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = ?e, model = %self.model, "Model stream error");
                    return Err(Error::Backend(format!("{:?}", e)));
                }
            }
        }

        Ok(ModelTurn {
            content: if content.is_empty() { None } else { Some(content) },
            tool_calls,
        })
    }
}
