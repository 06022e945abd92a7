//! Application context — everything a request handler needs, built once.

use std::sync::Arc;

use thiserror::Error;

use crate::agent_core::{build_system_prompt, Orchestrator, ToolRegistry};
use crate::config::AppConfig;
use crate::inference::{ChatModel, InferenceClient, InferenceError};
use crate::notify::{self, Notifier, NotifyError};
use crate::persona::{Persona, PersonaError};

/// Failures assembling the context from an already-validated config.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Persona(#[from] PersonaError),

    #[error("failed to create model client: {0}")]
    Inference(#[from] InferenceError),

    #[error("failed to create notifier: {0}")]
    Notify(#[from] NotifyError),
}

/// Shared, immutable state behind the HTTP surface.
pub struct AppContext {
    pub persona: Arc<Persona>,
    pub orchestrator: Orchestrator,
}

impl AppContext {
    /// Assemble the context from already-built parts.
    ///
    /// The system prompt is rendered here, once, and reused by every chat.
    pub fn build(
        persona: Persona,
        model: Arc<dyn ChatModel>,
        notifier: Arc<dyn Notifier>,
        max_tool_rounds: usize,
    ) -> Self {
        let system_prompt = build_system_prompt(&persona);
        let tools = Arc::new(ToolRegistry::new(notifier));
        let orchestrator = Orchestrator::new(model, tools, system_prompt, max_tool_rounds);
        Self {
            persona: Arc::new(persona),
            orchestrator,
        }
    }

    /// Load the persona documents and create the real clients.
    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let persona = Persona::load(&config.persona)?;
        let model = InferenceClient::from_settings(&config.model)?;
        let notifier = notify::from_settings(&config.notifications)?;

        tracing::info!(
            persona = %persona.name,
            model = %model.model_name(),
            base_url = %model.base_url(),
            notifications = config.notifications.enabled,
            max_tool_rounds = config.max_tool_rounds,
            "application context ready"
        );

        Ok(Self::build(
            persona,
            Arc::new(model),
            notifier,
            config.max_tool_rounds,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelSettings, NotificationSettings, PersonaSettings, ServerSettings};
    use crate::inference::model::ScriptedModel;
    use crate::notify::RecordingNotifier;

    fn config(dir: &std::path::Path) -> AppConfig {
        AppConfig {
            model: ModelSettings {
                api_key: "sk-test".into(),
                base_url: "http://127.0.0.1:1/v1".into(),
                model: "gpt-4o-mini".into(),
                temperature: None,
                max_tokens: None,
            },
            notifications: NotificationSettings {
                enabled: false,
                ..NotificationSettings::default()
            },
            persona: PersonaSettings {
                name: "Ada Lovelace".into(),
                summary_path: dir.join("summary.txt"),
                profile_path: dir.join("profile.txt"),
            },
            server: ServerSettings::default(),
            max_tool_rounds: 4,
        }
    }

    #[test]
    fn test_build_renders_prompt_once() {
        let ctx = AppContext::build(
            Persona::new("Ada", "bio text", "profile text"),
            Arc::new(ScriptedModel::replying(vec![])),
            Arc::new(RecordingNotifier::default()),
            10,
        );
        assert_eq!(ctx.persona.name, "Ada");
        assert!(ctx.orchestrator.system_prompt().contains("bio text"));
        assert!(ctx.orchestrator.system_prompt().contains("profile text"));
    }

    #[test]
    fn test_from_config_loads_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("summary.txt"), "Wrote the first program.").unwrap();
        std::fs::write(dir.path().join("profile.txt"), "Analyst, 1843").unwrap();

        let ctx = AppContext::from_config(&config(dir.path())).unwrap();
        assert_eq!(ctx.persona.biography, "Wrote the first program.");
        assert!(ctx.orchestrator.system_prompt().contains("Analyst, 1843"));
    }

    #[test]
    fn test_from_config_missing_document_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("profile.txt"), "Analyst").unwrap();

        let err = AppContext::from_config(&config(dir.path())).err().unwrap();
        assert!(matches!(err, StartupError::Persona(_)));
    }

    #[test]
    fn test_from_config_empty_api_key_is_inference_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("summary.txt"), "s").unwrap();
        std::fs::write(dir.path().join("profile.txt"), "p").unwrap();
        let mut config = config(dir.path());
        config.model.api_key = String::new();

        let err = AppContext::from_config(&config).err().unwrap();
        assert!(matches!(
            err,
            StartupError::Inference(InferenceError::ConfigError { .. })
        ));
    }
}
