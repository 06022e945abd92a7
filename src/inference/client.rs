//! OpenAI-compatible inference client.
//!
//! Sends non-streaming chat completion requests with the tool advertisements
//! attached and parses the first choice back into a [`ModelReply`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use crate::config::ModelSettings;

use super::errors::InferenceError;
use super::model::ChatModel;
use super::response::parse_completion_response;
use super::types::{ChatCompletionRequest, ChatMessage, ModelReply, ToolDefinition};

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total request timeout.
///
/// Hosted models answer long prompts (the whole profile rides along in the
/// system message) well inside this, but tool rounds add up.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ─── InferenceClient ─────────────────────────────────────────────────────────

/// Client for a hosted chat-completion endpoint.
pub struct InferenceClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    request_timeout: Duration,
}

impl InferenceClient {
    /// Create a client from the model settings.
    ///
    /// Does NOT check connectivity or the credential — that happens on the
    /// first request.
    pub fn from_settings(settings: &ModelSettings) -> Result<Self, InferenceError> {
        Self::with_timeout(settings, REQUEST_TIMEOUT)
    }

    /// Same as [`Self::from_settings`] with an explicit total request timeout.
    pub fn with_timeout(
        settings: &ModelSettings,
        request_timeout: Duration,
    ) -> Result<Self, InferenceError> {
        if settings.api_key.trim().is_empty() {
            return Err(InferenceError::ConfigError {
                reason: "model API key is empty".into(),
            });
        }

        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| InferenceError::ConnectionFailed {
                endpoint: settings.base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            request_timeout,
        })
    }

    /// The model identifier sent with every request.
    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// The base URL of the endpoint.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> ChatCompletionRequest {
        let tools = (!tools.is_empty()).then(|| tools.to_vec());
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            tool_choice: tools.as_ref().map(|_| "auto".to_string()),
            tools,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Send a non-streaming chat completion request.
    pub async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ModelReply, InferenceError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request(messages, tools);

        // Log the request metadata (not the full body — the system prompt is huge)
        tracing::info!(
            url = %url,
            model = %body.model,
            message_count = body.messages.len(),
            tool_count = body.tools.as_ref().map(|t| t.len()).unwrap_or(0),
            "=== LLM REQUEST ==="
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout {
                        duration_secs: self.request_timeout.as_secs(),
                    }
                } else {
                    InferenceError::ConnectionFailed {
                        endpoint: url.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let err = InferenceError::HttpError {
                status: status.as_u16(),
                body: body_text,
            };
            if err.is_auth_error() {
                tracing::error!(status = status.as_u16(), "model provider rejected the API key");
            }
            return Err(err);
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout {
                        duration_secs: self.request_timeout.as_secs(),
                    }
                } else {
                    InferenceError::MalformedResponse {
                        reason: format!("failed to read response body: {e}"),
                    }
                }
            })?;

        let reply = parse_completion_response(&body_text)?;
        tracing::info!(
            finish_reason = reply.finish_reason.as_deref().unwrap_or("none"),
            tool_calls = reply.tool_calls.len(),
            "=== LLM RESPONSE ==="
        );
        Ok(reply)
    }
}

#[async_trait]
impl ChatModel for InferenceClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ModelReply, InferenceError> {
        self.chat_completion(messages, tools).await
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
