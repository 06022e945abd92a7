//! HTTP chat surface.
//!
//! - `POST /api/chat`   `{message, history}` → `{response}`
//! - `GET  /api/health` → `{status, persona}`
//!
//! The handler is stateless across requests: the caller resends the full
//! history every turn.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::agent_core::AgentError;
use crate::context::AppContext;
use crate::inference::ChatMessage;

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Prior turns, without the system message.
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Build the router over a shared context.
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/health", get(health))
        .with_state(ctx)
}

/// Bind `bind` and serve until the process is stopped.
pub async fn serve(ctx: Arc<AppContext>, bind: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "chat server listening");
    axum::serve(listener, router(ctx)).await
}

/// POST /api/chat — answer one user message.
async fn chat(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    tracing::info!(history_len = req.history.len(), "chat request");

    match ctx.orchestrator.chat(&req.message, &req.history).await {
        Ok(response) => (
            StatusCode::OK,
            Json(serde_json::json!(ChatResponse { response })),
        ),
        Err(e) => {
            let status = match e {
                AgentError::Inference(_) => StatusCode::BAD_GATEWAY,
                AgentError::ToolRoundLimit { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            };
            tracing::warn!(status = status.as_u16(), error = %e, "chat failed");
            (status, Json(serde_json::json!({"error": e.to_string()})))
        }
    }
}

/// GET /api/health
async fn health(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "persona": ctx.persona.name}))
}
