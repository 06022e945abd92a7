//! Agent Core error types.

use thiserror::Error;

use crate::inference::InferenceError;

/// Errors that abort a `chat` call.
///
/// Tool dispatch problems never show up here: the registry recovers them
/// locally with an empty result.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model call failed; no retry is attempted.
    #[error("model call failed: {0}")]
    Inference(#[from] InferenceError),

    /// The model kept requesting tools past the configured round limit.
    #[error("model still requesting tools after {rounds} rounds")]
    ToolRoundLimit { rounds: usize },
}
