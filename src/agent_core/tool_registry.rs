//! ToolRegistry — the fixed set of actions the model may call.
//!
//! The registry is the bridge between the model's tool call decisions and
//! the recorders. It handles:
//! - Advertisement (name, description, JSON schema) in OpenAI tool format
//! - Lookup by name in a table built once at startup
//! - Argument decoding into the handler's named parameters
//! - Result serialization back to JSON text
//!
//! Dispatch never fails: an unknown tool name or unusable arguments produce
//! the empty object `{}` so the round can continue.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::inference::types::{FunctionDefinition, ToolDefinition};
use crate::notify::Notifier;

use super::recorders::{GapRecorder, LeadRecorder, Recorded};

/// Result substituted when a call cannot be dispatched.
pub const EMPTY_RESULT: &str = "{}";

pub const RECORD_USER_DETAILS: &str = "record_user_details";
pub const RECORD_UNKNOWN_QUESTION: &str = "record_unknown_question";

// ─── Descriptors ────────────────────────────────────────────────────────────

/// Which handler a descriptor routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handler {
    RecordUserDetails,
    RecordUnknownQuestion,
}

/// One advertised tool.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON schema of the parameters object.
    pub parameters: Value,
    handler: Handler,
}

impl ToolDescriptor {
    /// This tool in the OpenAI `tools` array format.
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            r#type: "function".to_string(),
            function: FunctionDefinition {
                name: self.name.to_string(),
                description: self.description.to_string(),
                parameters: self.parameters.clone(),
            },
        }
    }
}

fn builtin_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: RECORD_USER_DETAILS,
            description: "Use this tool to record that a user is interested in being in touch \
                and provided an email address",
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "email": {
                        "type": "string",
                        "description": "The email address of this user"
                    },
                    "name": {
                        "type": "string",
                        "description": "The user's name, if they provided it"
                    },
                    "notes": {
                        "type": "string",
                        "description": "Any additional information about the conversation \
                            that's worth recording to give context"
                    }
                },
                "required": ["email"],
                "additionalProperties": false
            }),
            handler: Handler::RecordUserDetails,
        },
        ToolDescriptor {
            name: RECORD_UNKNOWN_QUESTION,
            description: "Always use this tool to record any question that couldn't be answered \
                as you didn't know the answer",
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "The question that couldn't be answered"
                    }
                },
                "required": ["question"],
                "additionalProperties": false
            }),
            handler: Handler::RecordUnknownQuestion,
        },
    ]
}

// ─── Arguments ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UserDetailsArgs {
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnknownQuestionArgs {
    question: String,
}

// ─── ToolRegistry ───────────────────────────────────────────────────────────

/// Static name → handler table plus the recorders the handlers call.
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    leads: LeadRecorder,
    gaps: GapRecorder,
}

impl ToolRegistry {
    /// Build the registry with both recorders notifying through `notifier`.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            tools: builtin_descriptors(),
            leads: LeadRecorder::new(notifier.clone()),
            gaps: GapRecorder::new(notifier),
        }
    }

    /// Tool advertisements for the model, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(ToolDescriptor::to_definition).collect()
    }

    /// Registered tool names, in registration order.
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name).collect()
    }

    pub fn get_tool(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Run the tool `name` with the model-supplied `arguments_json` and
    /// return its result as JSON text.
    pub async fn dispatch(&self, name: &str, arguments_json: &str) -> String {
        tracing::info!(tool = %name, "tool called");

        let Some(descriptor) = self.get_tool(name) else {
            tracing::warn!(tool = %name, "unknown tool requested, returning empty result");
            return EMPTY_RESULT.to_string();
        };

        let arguments: Value = match serde_json::from_str(arguments_json) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "tool arguments are not valid JSON");
                return EMPTY_RESULT.to_string();
            }
        };

        match self.run(descriptor.handler, arguments).await {
            Ok(recorded) => serde_json::to_string(&recorded).unwrap_or_else(|e| {
                tracing::warn!(tool = %name, error = %e, "failed to serialize tool result");
                EMPTY_RESULT.to_string()
            }),
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "tool arguments do not match its parameters");
                EMPTY_RESULT.to_string()
            }
        }
    }

    async fn run(&self, handler: Handler, arguments: Value) -> Result<Recorded, serde_json::Error> {
        match handler {
            Handler::RecordUserDetails => {
                let args: UserDetailsArgs = serde_json::from_value(arguments)?;
                Ok(self
                    .leads
                    .record_contact(&args.email, args.name.as_deref(), args.notes.as_deref())
                    .await)
            }
            Handler::RecordUnknownQuestion => {
                let args: UnknownQuestionArgs = serde_json::from_value(arguments)?;
                Ok(self.gaps.record_gap(&args.question).await)
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;

    fn registry() -> (ToolRegistry, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        (ToolRegistry::new(notifier.clone()), notifier)
    }

    #[test]
    fn test_definitions_advertise_both_tools() {
        let (registry, _) = registry();
        let defs = registry.definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(registry.tool_names(), vec![RECORD_USER_DETAILS, RECORD_UNKNOWN_QUESTION]);

        let json = serde_json::to_value(&defs).unwrap();
        assert_eq!(json[0]["type"], "function");
        assert_eq!(json[0]["function"]["parameters"]["required"], serde_json::json!(["email"]));
        assert_eq!(json[0]["function"]["parameters"]["additionalProperties"], false);
        assert_eq!(json[1]["function"]["parameters"]["required"], serde_json::json!(["question"]));
    }

    #[tokio::test]
    async fn test_dispatch_record_user_details() {
        let (registry, notifier) = registry();
        let result = registry
            .dispatch(RECORD_USER_DETAILS, r#"{"email": "a@b.com", "name": "Bo"}"#)
            .await;

        assert_eq!(result, r#"{"recorded":"ok"}"#);
        assert_eq!(
            notifier.sent(),
            vec!["Recording Bo with email a@b.com and notes not provided".to_string()]
        );
    }

    #[tokio::test]
    async fn test_dispatch_record_unknown_question() {
        let (registry, notifier) = registry();
        let result = registry
            .dispatch(RECORD_UNKNOWN_QUESTION, r#"{"question": "Favourite colour?"}"#)
            .await;

        assert_eq!(result, r#"{"recorded":"ok"}"#);
        assert_eq!(notifier.sent(), vec!["Recording Favourite colour?".to_string()]);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_is_empty_object() {
        let (registry, notifier) = registry();
        let result = registry.dispatch("send_bitcoin", r#"{"to": "me"}"#).await;
        assert_eq!(result, "{}");
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_malformed_json_is_empty_object() {
        let (registry, notifier) = registry();
        let result = registry.dispatch(RECORD_UNKNOWN_QUESTION, "{question: oops").await;
        assert_eq!(result, "{}");
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_mismatched_arguments_is_empty_object() {
        let (registry, notifier) = registry();

        // Missing the required field.
        let missing = registry.dispatch(RECORD_USER_DETAILS, r#"{"name": "Bo"}"#).await;
        // A parameter the handler does not take.
        let extra = registry
            .dispatch(RECORD_UNKNOWN_QUESTION, r#"{"question": "q", "urgency": "high"}"#)
            .await;
        // Not an object at all.
        let scalar = registry.dispatch(RECORD_UNKNOWN_QUESTION, r#""just text""#).await;

        assert_eq!(missing, "{}");
        assert_eq!(extra, "{}");
        assert_eq!(scalar, "{}");
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_survives_notifier_failure() {
        let notifier = Arc::new(RecordingNotifier::failing());
        let registry = ToolRegistry::new(notifier.clone());
        let result = registry
            .dispatch(RECORD_UNKNOWN_QUESTION, r#"{"question": "q"}"#)
            .await;
        assert_eq!(result, r#"{"recorded":"ok"}"#);
    }
}
