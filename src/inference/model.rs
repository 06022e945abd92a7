//! The seam between the agent loop and the model provider.

use async_trait::async_trait;

use super::errors::InferenceError;
use super::types::{ChatMessage, ModelReply, ToolDefinition};

/// Anything that can answer a conversation with tools advertised.
///
/// The provider is opaque to the agent loop: messages and tools go in, either
/// a text answer or a list of tool calls comes out.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ModelReply, InferenceError>;
}

/// Scripted model for tests: replays replies in order and records every
/// message list it was called with.
#[cfg(test)]
pub struct ScriptedModel {
    replies: std::sync::Mutex<std::collections::VecDeque<Result<ModelReply, InferenceError>>>,
    calls: std::sync::Mutex<Vec<Vec<ChatMessage>>>,
    tools: std::sync::Mutex<Vec<Vec<ToolDefinition>>>,
}

#[cfg(test)]
impl ScriptedModel {
    pub fn new(replies: Vec<Result<ModelReply, InferenceError>>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies.into()),
            calls: std::sync::Mutex::new(Vec::new()),
            tools: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: Vec<ModelReply>) -> Self {
        Self::new(replies.into_iter().map(Ok).collect())
    }

    /// Message lists seen so far, one entry per `complete` call.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }

    /// Tool lists advertised so far, one entry per `complete` call.
    pub fn tools(&self) -> Vec<Vec<ToolDefinition>> {
        self.tools.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ModelReply, InferenceError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.tools.lock().unwrap().push(tools.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ModelReply::text("no more scripted replies")))
    }
}
