//! Orchestrator - the model/tool dispatch loop
//!
//! Drives one conversation: send the transcript and the tool catalog
//! to the model backend, execute any tool calls it requests, feed the
//! results back, and repeat until the model produces a final answer
//! or the iteration cap is hit. Tool failures are evidence for the
//! model to correct itself; backend failures and iteration exhaustion
//! end the turn.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::executor::ToolExecutor;
use super::session::{ChatMessage, ChatSession};
use crate::error::{Error, Result};
use crate::provider::{ModelBackend, ModelTurn, ToolCall};
use crate::tools::ToolDefinition;

/// Orchestrator tuning knobs
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum model/tool round-trips per user message
    pub max_iterations: usize,
    /// Total attempts for one backend call (first try included)
    pub backend_attempts: usize,
    /// First retry delay; doubles per attempt
    pub retry_base_delay: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 8,
            backend_attempts: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

/// Cooperative cancellation flag for a conversation
///
/// Checked at the top of each loop pass; an already-dispatched call
/// is allowed to finish or time out before the turn fails.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Where the loop stands: waiting on the model, or holding tool
/// calls it still has to execute
enum LoopState {
    AwaitingModel,
    AwaitingTool(Vec<ToolCall>),
}

/// One conversation's orchestrator
///
/// Owns the session; nothing else appends to the transcript.
pub struct Orchestrator {
    backend: Arc<dyn ModelBackend>,
    executor: ToolExecutor,
    session: ChatSession,
    catalog: Vec<ToolDefinition>,
    config: OrchestratorConfig,
    cancel: CancelHandle,
}

impl Orchestrator {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        executor: ToolExecutor,
        config: OrchestratorConfig,
    ) -> Self {
        let catalog = executor.registry().catalog();
        Self {
            backend,
            executor,
            session: ChatSession::new(),
            catalog,
            config,
            cancel: CancelHandle::new(),
        }
    }

    /// Handle to cancel the in-flight turn from another task
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Read-only view of the conversation so far
    pub fn transcript(&self) -> &[ChatMessage] {
        self.session.transcript()
    }

    /// Tool catalog as presented to the model
    pub fn catalog(&self) -> &[ToolDefinition] {
        &self.catalog
    }

    /// Drop the conversation history (the `clear` command)
    pub fn clear_history(&mut self) {
        self.session.clear();
        info!("Conversation history cleared");
    }

    /// Submit a user message and run the loop to a final answer
    pub async fn submit(&mut self, user_text: impl Into<String>) -> Result<String> {
        self.cancel.reset();
        self.session.reset_iterations();
        self.session.push(ChatMessage::user(user_text));

        let mut state = LoopState::AwaitingModel;

        loop {
            if self.cancel.is_cancelled() {
                warn!("Turn cancelled by caller");
                return Err(Error::Cancelled);
            }

            match state {
                LoopState::AwaitingModel => {
                    let turn = self.call_backend().await?;

                    let content = turn.content.clone().unwrap_or_default();

                    if turn.tool_calls.is_empty() {
                        // Final answer
                        self.session.push(ChatMessage::assistant(&content, Vec::new()));
                        debug!(
                            iterations = self.session.iterations(),
                            "Turn complete"
                        );
                        return Ok(content);
                    }

                    self.session
                        .push(ChatMessage::assistant(content, turn.tool_calls.clone()));
                    state = LoopState::AwaitingTool(turn.tool_calls);
                }

                LoopState::AwaitingTool(calls) => {
                    // Calls are causally dependent on the model's
                    // decision, so they run one after another
                    for call in &calls {
                        let record = self.executor.execute(call).await;
                        self.session.push(ChatMessage::tool_result(
                            record.call_id,
                            record.payload,
                            !record.success,
                        ));
                    }

                    self.session.bump_iterations();

                    if self.session.iterations() >= self.config.max_iterations {
                        warn!(
                            cap = self.config.max_iterations,
                            "Iteration limit reached without a final answer"
                        );
                        return Err(Error::IterationLimit(self.config.max_iterations));
                    }

                    state = LoopState::AwaitingModel;
                }
            }
        }
    }

    /// Call the backend with bounded retry and exponential backoff
    ///
    /// A response with neither text nor tool calls counts as a failed
    /// attempt: it is a malformed backend response, not something the
    /// loop can interpret.
    async fn call_backend(&self) -> Result<ModelTurn> {
        let mut delay = self.config.retry_base_delay;
        let mut last_error = None;

        for attempt in 1..=self.config.backend_attempts {
            match self.backend.complete(self.session.transcript(), &self.catalog).await {
                Ok(turn) if turn.is_empty() => {
                    warn!(attempt, "Model returned an empty response");
                    last_error = Some(Error::Backend(
                        "model returned neither an answer nor a tool call".to_string(),
                    ));
                }
                Ok(turn) => return Ok(turn),
                Err(Error::Backend(detail)) => {
                    warn!(attempt, %detail, "Model backend call failed");
                    last_error = Some(Error::Backend(detail));
                }
                Err(other) => return Err(other),
            }

            if attempt < self.config.backend_attempts {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::Backend("model backend unavailable".to_string())))
    }
}
