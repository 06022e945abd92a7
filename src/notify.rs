//! Push notifications for leads and unanswered questions.
//!
//! Delivery is fire-and-forget. Implementations report failures through
//! `Result` so they can be logged, but callers go through
//! [`notify_best_effort`], which logs and continues: a lost notification
//! never changes what the visitor sees.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use thiserror::Error;

use crate::config::NotificationSettings;

/// Timeout for a single notification POST.
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The request never got a response.
    #[error("notification transport failed: {reason}")]
    Transport { reason: String },

    /// The push service answered with a non-2xx status.
    #[error("notification rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Sends a short text message to whoever runs the site.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Send `text`, logging (never returning) any failure.
pub async fn notify_best_effort(notifier: &dyn Notifier, text: &str) {
    match notifier.send(text).await {
        Ok(()) => tracing::debug!(chars = text.len(), "notification sent"),
        Err(e) => tracing::warn!(error = %e, "notification dropped"),
    }
}

// ─── Pushover ────────────────────────────────────────────────────────────────

/// Pushover message API client.
pub struct PushoverNotifier {
    http: HttpClient,
    endpoint: String,
    token: String,
    user: String,
}

impl PushoverNotifier {
    pub fn from_settings(settings: &NotificationSettings) -> Result<Self, NotifyError> {
        let http = HttpClient::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Transport {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
            token: settings.token.clone(),
            user: settings.user.clone(),
        })
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let form = [
            ("token", self.token.as_str()),
            ("user", self.user.as_str()),
            ("message", text),
        ];

        let resp = self
            .http
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| NotifyError::Transport {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

// ─── Log-only ────────────────────────────────────────────────────────────────

/// Used when push credentials are not configured: the message goes to the
/// log instead.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        tracing::info!(message = %text, "notification (push disabled)");
        Ok(())
    }
}

/// Build the notifier the settings ask for.
pub fn from_settings(
    settings: &NotificationSettings,
) -> Result<std::sync::Arc<dyn Notifier>, NotifyError> {
    if settings.enabled {
        Ok(std::sync::Arc::new(PushoverNotifier::from_settings(settings)?))
    } else {
        Ok(std::sync::Arc::new(LogNotifier))
    }
}

// ─── Test doubles ────────────────────────────────────────────────────────────

/// Records every message; optionally fails every send after recording it.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingNotifier {
    sent: std::sync::Mutex<Vec<String>>,
    fail: bool,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: std::sync::Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(NotifyError::Transport {
                reason: "push service unreachable".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Form, Router};

    type Captured = Arc<Mutex<Vec<HashMap<String, String>>>>;

    async fn stub_pushover(status: StatusCode) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();
        let app = Router::new().route(
            "/1/messages.json",
            post(move |Form(fields): Form<HashMap<String, String>>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(fields);
                    (status, r#"{"status":1}"#)
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/1/messages.json"), captured)
    }

    fn settings(endpoint: &str) -> NotificationSettings {
        NotificationSettings {
            enabled: true,
            token: "app-token".to_string(),
            user: "user-key".to_string(),
            endpoint: endpoint.to_string(),
        }
    }

    #[tokio::test]
    async fn test_pushover_posts_three_form_fields() {
        let (endpoint, captured) = stub_pushover(StatusCode::OK).await;
        let notifier = PushoverNotifier::from_settings(&settings(&endpoint)).unwrap();

        notifier.send("Recording hello").await.unwrap();

        let seen = captured.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["token"], "app-token");
        assert_eq!(seen[0]["user"], "user-key");
        assert_eq!(seen[0]["message"], "Recording hello");
        assert_eq!(seen[0].len(), 3);
    }

    #[tokio::test]
    async fn test_pushover_rejection_is_reported() {
        let (endpoint, _) = stub_pushover(StatusCode::BAD_REQUEST).await;
        let notifier = PushoverNotifier::from_settings(&settings(&endpoint)).unwrap();

        let err = notifier.send("x").await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failure() {
        let notifier = RecordingNotifier::failing();
        notify_best_effort(&notifier, "lost message").await;
        assert_eq!(notifier.sent(), vec!["lost message".to_string()]);
    }

    #[tokio::test]
    async fn test_best_effort_swallows_unreachable_endpoint() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let notifier =
            PushoverNotifier::from_settings(&settings(&format!("http://{addr}/1/messages.json")))
                .unwrap();
        // Must return normally.
        notify_best_effort(&notifier, "nobody listening").await;
    }

    #[tokio::test]
    async fn test_disabled_settings_build_log_notifier() {
        let mut s = settings("http://unused");
        s.enabled = false;
        let notifier = from_settings(&s).unwrap();
        notifier.send("kept locally").await.unwrap();
    }
}
