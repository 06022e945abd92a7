//! Inference Client — OpenAI-compatible chat-completion client.
//!
//! This module handles all communication with the hosted model:
//! - Non-streaming chat completions with tool advertisements
//! - Response parsing into text or tool-call requests
//! - The `ChatModel` trait the agent loop is written against
//!
//! The client speaks the OpenAI Chat Completions API, so any provider
//! exposing that surface works by changing the base URL and model name.

pub mod client;
pub mod errors;
pub mod model;
pub mod response;
pub mod types;

// Re-exports for convenience
pub use client::InferenceClient;
pub use errors::InferenceError;
pub use model::ChatModel;
pub use types::{ChatMessage, ModelReply, Role, ToolCallRequest, ToolDefinition};
