//! Application configuration loading and validation.
//!
//! Settings come from the process environment (after `.env` is applied), or
//! from a YAML file named by `CAREER_CHAT_CONFIG`. The YAML file may reference
//! environment variables as `${VAR}` or `${VAR:-default}` so credentials stay
//! out of it. Config is resolved once at startup; there is no runtime
//! reconfiguration.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Env var naming an optional YAML config file.
pub const CONFIG_PATH_VAR: &str = "CAREER_CHAT_CONFIG";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_PUSHOVER_ENDPOINT: &str = "https://api.pushover.net/1/messages.json";
const DEFAULT_SUMMARY_PATH: &str = "me/summary.txt";
const DEFAULT_PROFILE_PATH: &str = "me/linkedin.pdf";
const DEFAULT_BIND: &str = "127.0.0.1:7860";

/// Maximum tool-call rounds per `chat` before the loop fails closed.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 10;

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Configuration loading or validation error. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is absent or empty.
    #[error("missing required setting: {name}")]
    Missing { name: String },

    /// A setting is present but unusable.
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },

    /// The YAML config file could not be read or parsed.
    #[error("failed to load {path}: {reason}")]
    File { path: String, reason: String },
}

// ─── Public Types ────────────────────────────────────────────────────────────

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub model: ModelSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    pub persona: PersonaSettings,
    #[serde(default)]
    pub server: ServerSettings,
    /// Tool-call rounds allowed per `chat` call.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
}

/// Chat-completion provider settings.
#[derive(Clone, Deserialize)]
pub struct ModelSettings {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// Push notification (Pushover) settings.
#[derive(Clone, Deserialize)]
pub struct NotificationSettings {
    /// When `false`, notifications are logged locally instead of sent.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub user: String,
    #[serde(default = "default_pushover_endpoint")]
    pub endpoint: String,
}

/// Who the assistant represents and where their documents live.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonaSettings {
    pub name: String,
    #[serde(default = "default_summary_path")]
    pub summary_path: PathBuf,
    #[serde(default = "default_profile_path")]
    pub profile_path: PathBuf,
}

/// HTTP chat surface settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_true() -> bool {
    true
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_pushover_endpoint() -> String {
    DEFAULT_PUSHOVER_ENDPOINT.to_string()
}
fn default_summary_path() -> PathBuf {
    PathBuf::from(DEFAULT_SUMMARY_PATH)
}
fn default_profile_path() -> PathBuf {
    PathBuf::from(DEFAULT_PROFILE_PATH)
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_max_tool_rounds() -> usize {
    DEFAULT_MAX_TOOL_ROUNDS
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            token: String::new(),
            user: String::new(),
            endpoint: default_pushover_endpoint(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

// Credentials never reach Debug output (and therefore never reach the log).
impl std::fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl std::fmt::Debug for NotificationSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationSettings")
            .field("enabled", &self.enabled)
            .field("token", &"<redacted>")
            .field("user", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Apply `.env` from the working directory, overriding the inherited
/// environment. Returns the file used; a missing `.env` is fine.
///
/// Runs before logging is set up, since `.env` may carry `RUST_LOG` and the
/// log directory.
pub fn apply_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv_override().ok()
}

/// Apply the dotenv file at `path`, overriding the inherited environment.
pub fn apply_dotenv_file(path: &Path) -> Result<(), ConfigError> {
    dotenvy::from_path_override(path).map_err(|e| ConfigError::File {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

impl AppConfig {
    /// Resolve the configuration for this process.
    ///
    /// 1. Reads the YAML file named by `CAREER_CHAT_CONFIG`, if set.
    /// 2. Otherwise reads individual environment variables.
    ///
    /// `.env` must already be applied (see [`apply_dotenv`]). The result is
    /// validated before it is returned.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) if !path.trim().is_empty() => {
                Self::from_yaml_file(Path::new(&path), |k| std::env::var(k).ok())?
            }
            _ => Self::from_lookup(|k| std::env::var(k).ok())?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Build the configuration from flat environment-style variables.
    ///
    /// `lookup` returns the value of a variable, or `None` when unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &str| {
            get(name).ok_or_else(|| ConfigError::Missing {
                name: name.to_string(),
            })
        };

        let notifications_enabled = match get("CAREER_CHAT_NOTIFICATIONS") {
            Some(v) => parse_switch("CAREER_CHAT_NOTIFICATIONS", &v)?,
            None => true,
        };

        let notifications = if notifications_enabled {
            NotificationSettings {
                enabled: true,
                token: require("PUSHOVER_TOKEN")?,
                user: require("PUSHOVER_USER")?,
                endpoint: get("PUSHOVER_ENDPOINT").unwrap_or_else(default_pushover_endpoint),
            }
        } else {
            NotificationSettings {
                enabled: false,
                ..NotificationSettings::default()
            }
        };

        let max_tool_rounds = match get("MAX_TOOL_ROUNDS") {
            Some(v) => v.trim().parse().map_err(|e| ConfigError::Invalid {
                name: "MAX_TOOL_ROUNDS".into(),
                reason: format!("{e}"),
            })?,
            None => DEFAULT_MAX_TOOL_ROUNDS,
        };

        Ok(Self {
            model: ModelSettings {
                api_key: require("OPENAI_API_KEY")?,
                base_url: get("OPENAI_BASE_URL").unwrap_or_else(default_base_url),
                model: get("OPENAI_MODEL").unwrap_or_else(default_model),
                temperature: None,
                max_tokens: None,
            },
            notifications,
            persona: PersonaSettings {
                name: require("PERSONA_NAME")?,
                summary_path: get("PERSONA_SUMMARY_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_summary_path),
                profile_path: get("PERSONA_PROFILE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_profile_path),
            },
            server: ServerSettings {
                bind: get("CAREER_CHAT_BIND").unwrap_or_else(default_bind),
            },
            max_tool_rounds,
        })
    }

    /// Load and parse a YAML config file, interpolating `${VAR}` references.
    pub fn from_yaml_file<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml_str(&raw, lookup).map_err(|e| match e {
            ConfigError::File { reason, .. } => ConfigError::File {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Parse YAML config text, interpolating `${VAR}` references.
    pub fn from_yaml_str<F>(raw: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let interpolated = interpolate_env_vars(raw, &lookup);
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::File {
            path: "<inline>".into(),
            reason: format!("failed to parse config: {e}"),
        })
    }

    /// Reject configurations the process must not start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.api_key.trim().is_empty() {
            return Err(ConfigError::Missing {
                name: "model.api_key".into(),
            });
        }
        if self.persona.name.trim().is_empty() {
            return Err(ConfigError::Missing {
                name: "persona.name".into(),
            });
        }
        if self.notifications.enabled {
            if self.notifications.token.trim().is_empty() {
                return Err(ConfigError::Missing {
                    name: "notifications.token".into(),
                });
            }
            if self.notifications.user.trim().is_empty() {
                return Err(ConfigError::Missing {
                    name: "notifications.user".into(),
                });
            }
        }
        if self.max_tool_rounds == 0 {
            return Err(ConfigError::Invalid {
                name: "max_tool_rounds".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

fn parse_switch(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => Err(ConfigError::Invalid {
            name: name.to_string(),
            reason: format!("expected on/off, got '{other}'"),
        }),
    }
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in a string.
fn interpolate_env_vars<F>(input: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_expr = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_expr.push(c);
            }
            result.push_str(&resolve_var_expr(&var_expr, lookup));
        } else {
            result.push(ch);
        }
    }

    result
}

/// Resolve a variable expression like `VAR` or `VAR:-default`.
fn resolve_var_expr<F>(expr: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(idx) = expr.find(":-") {
        let var_name = &expr[..idx];
        let default = &expr[idx + 2..];
        lookup(var_name).unwrap_or_else(|| expand_tilde(default))
    } else {
        lookup(expr).unwrap_or_default()
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
