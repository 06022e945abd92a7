//! Chat completion response parser.
//!
//! Reduces a non-streaming `POST /chat/completions` body to a [`ModelReply`]:
//! the first choice's text, its tool calls, and its finish reason.

use serde::Deserialize;
use uuid::Uuid;

use super::errors::InferenceError;
use super::types::{FunctionCall, ModelReply, ToolCallRequest};

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<CompletionToolCall>>,
}

#[derive(Deserialize)]
struct CompletionToolCall {
    id: Option<String>,
    function: FunctionCall,
}

/// Parse a non-streaming chat completion body.
///
/// Tool call arguments are kept as the raw text the model emitted. A tool
/// call without an id gets a generated `call_<uuid>` so its result can still
/// be paired with it.
pub fn parse_completion_response(body: &str) -> Result<ModelReply, InferenceError> {
    let resp: CompletionResponse =
        serde_json::from_str(body).map_err(|e| InferenceError::MalformedResponse {
            reason: format!("failed to parse chat completion: {e}"),
        })?;

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or(InferenceError::MalformedResponse {
            reason: "empty choices array".into(),
        })?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| ToolCallRequest {
            id: tc.id.unwrap_or_else(|| format!("call_{}", Uuid::new_v4())),
            r#type: "function".to_string(),
            function: tc.function,
        })
        .collect();

    Ok(ModelReply {
        content: choice.message.content,
        tool_calls,
        finish_reason: choice.finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_answer() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "I worked on compilers."},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }"#;
        let reply = parse_completion_response(body).unwrap();
        assert_eq!(reply.content.as_deref(), Some("I worked on compilers."));
        assert!(reply.tool_calls.is_empty());
        assert_eq!(reply.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_parse_tool_calls_keeps_raw_arguments() {
        let body = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "call_a", "type": "function",
                         "function": {"name": "record_user_details", "arguments": "{\"email\":\"a@b.com\"}"}},
                        {"id": "call_b", "type": "function",
                         "function": {"name": "record_unknown_question", "arguments": "{\"question\":\"?\"}"}}
                    ]
                },
                "finish_reason": "tool_calls"
            }]
        }"#;
        let reply = parse_completion_response(body).unwrap();
        assert!(reply.content.is_none());
        assert_eq!(reply.tool_calls.len(), 2);
        assert_eq!(reply.tool_calls[0].id, "call_a");
        assert_eq!(reply.tool_calls[0].function.arguments, r#"{"email":"a@b.com"}"#);
        assert_eq!(reply.tool_calls[1].function.name, "record_unknown_question");
        assert!(reply.wants_tools());
    }

    #[test]
    fn test_parse_generates_missing_tool_call_id() {
        let body = r#"{"choices": [{"message": {"content": "", "tool_calls": [
            {"function": {"name": "record_unknown_question", "arguments": "{}"}}
        ]}, "finish_reason": "tool_calls"}]}"#;
        let reply = parse_completion_response(body).unwrap();
        assert!(reply.tool_calls[0].id.starts_with("call_"));
    }

    #[test]
    fn test_parse_empty_choices_is_error() {
        let err = parse_completion_response(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, InferenceError::MalformedResponse { .. }));
    }

    #[test]
    fn test_parse_garbage_is_error() {
        let err = parse_completion_response("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, InferenceError::MalformedResponse { .. }));
    }
}
