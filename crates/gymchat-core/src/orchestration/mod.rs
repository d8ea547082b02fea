//! Orchestration: session transcript, tool executor and the
//! model/tool dispatch loop

mod executor;
mod orchestrator;
mod session;

pub use executor::{ToolExecutor, ToolResultRecord};
pub use orchestrator::{CancelHandle, Orchestrator, OrchestratorConfig};
pub use session::{ChatMessage, ChatSession, Role};
