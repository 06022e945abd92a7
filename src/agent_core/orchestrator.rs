//! Orchestrator — the per-message agent loop.
//!
//! One `chat` call runs:
//!
//! ```text
//! messages = [system] + history + [user]
//! loop {
//!     reply = model(messages, tools)
//!     no tool calls  → return reply text
//!     tool calls     → append assistant turn, dispatch each call in order,
//!                      append one tool result per call, go again
//! }
//! ```
//!
//! The loop is capped at `max_tool_rounds` tool rounds and fails closed past
//! that. The caller's history is never modified.

use std::sync::Arc;

use crate::inference::types::{ChatMessage, ToolDefinition};
use crate::inference::ChatModel;

use super::errors::AgentError;
use super::tool_registry::ToolRegistry;

/// Runs conversations against one model with one tool registry.
///
/// Holds only immutable state, so a single instance serves any number of
/// concurrent `chat` calls.
pub struct Orchestrator {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    tool_definitions: Vec<ToolDefinition>,
    system_prompt: String,
    max_tool_rounds: usize,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: Arc<ToolRegistry>,
        system_prompt: String,
        max_tool_rounds: usize,
    ) -> Self {
        let tool_definitions = tools.definitions();
        Self {
            model,
            tools,
            tool_definitions,
            system_prompt,
            max_tool_rounds,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Answer `message` given the prior `history` (which excludes the system
    /// message).
    ///
    /// Model errors propagate unchanged; there is no retry.
    pub async fn chat(&self, message: &str, history: &[ChatMessage]) -> Result<String, AgentError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(message));

        let mut tool_rounds = 0;
        loop {
            tracing::debug!(
                round = tool_rounds,
                message_count = messages.len(),
                "calling model"
            );
            let reply = self
                .model
                .complete(&messages, &self.tool_definitions)
                .await?;

            if !reply.wants_tools() {
                tracing::info!(
                    tool_rounds,
                    finish_reason = reply.finish_reason.as_deref().unwrap_or("none"),
                    "chat complete"
                );
                return Ok(reply.content.unwrap_or_default());
            }

            if tool_rounds >= self.max_tool_rounds {
                tracing::error!(
                    rounds = tool_rounds,
                    pending_calls = reply.tool_calls.len(),
                    "tool round limit reached, aborting chat"
                );
                return Err(AgentError::ToolRoundLimit { rounds: tool_rounds });
            }
            tool_rounds += 1;

            tracing::info!(
                round = tool_rounds,
                tool_count = reply.tool_calls.len(),
                "model requested tools"
            );

            let calls = reply.tool_calls;
            messages.push(ChatMessage::assistant_tool_calls(reply.content, calls.clone()));
            for call in &calls {
                let result = self
                    .tools
                    .dispatch(&call.function.name, &call.function.arguments)
                    .await;
                messages.push(ChatMessage::tool_result(call.id.clone(), result));
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
