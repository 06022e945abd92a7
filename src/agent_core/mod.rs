//! Agent Core — the persona's conversation loop.
//!
//! Submodules:
//! - `prompt`: System prompt built from the persona documents
//! - `recorders`: Lead and knowledge-gap recording actions
//! - `tool_registry`: Tool advertisements and name-based dispatch
//! - `orchestrator`: Model ↔ tool loop for one user message
//! - `errors`: Agent-level error types

pub mod errors;
pub mod orchestrator;
pub mod prompt;
pub mod recorders;
pub mod tool_registry;

// Re-exports for convenience
pub use errors::AgentError;
pub use orchestrator::Orchestrator;
pub use prompt::build_system_prompt;
pub use recorders::{GapRecorder, LeadRecorder, Recorded};
pub use tool_registry::ToolRegistry;
