//! `steward.toml` loading and validation.
//!
//! ```toml
//! [app]
//! id = 123456
//! private_key_path = "/run/secrets/steward.pem"   # or private_key_env
//!
//! [webhook]
//! listen = "0.0.0.0:3000"
//!
//! [logging]
//! format = "json"
//! otlp_endpoint = "http://localhost:4317"
//!
//! [[workflows]]   # optional; replaces the built-in workflows
//! ```

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use pipeline::{workflows, AppId, SecretString, WorkflowDefinition};
use serde::Deserialize;
use thiserror::Error;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

pub const DEFAULT_CONFIG_PATH: &str = "steward.toml";
pub const DEFAULT_PRIVATE_KEY_ENV: &str = "STEWARD_APP_PRIVATE_KEY";
pub const DEFAULT_WEBHOOK_SECRET_ENV: &str = "STEWARD_WEBHOOK_SECRET";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("This command needs an [app] section with the GitHub App id")]
    MissingApp,

    #[error("GitHub App private key unavailable: {message}")]
    PrivateKey { message: String },

    #[error("Webhook secret unavailable: environment variable {variable} is not set")]
    WebhookSecret { variable: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StewardConfig {
    #[serde(default)]
    pub app: Option<AppConfig>,

    #[serde(default)]
    pub webhook: WebhookConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Replaces the built-in workflows when non-empty.
    #[serde(default)]
    pub workflows: Vec<WorkflowDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub id: u64,

    /// PEM file holding the App private key. Takes precedence over
    /// `private_key_env`.
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,

    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    #[serde(default = "default_webhook_secret_env")]
    pub secret_env: String,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_private_key_env() -> String {
    DEFAULT_PRIVATE_KEY_ENV.to_string()
}

fn default_api_url() -> String {
    github::DEFAULT_API_URL.to_string()
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_webhook_secret_env() -> String {
    DEFAULT_WEBHOOK_SECRET_ENV.to_string()
}

fn default_queue_capacity() -> usize {
    listener::DEFAULT_QUEUE_CAPACITY
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            secret_env: default_webhook_secret_env(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn read_env(variable: &str) -> Option<String> {
    std::env::var(variable).ok().filter(|v| !v.trim().is_empty())
}

impl StewardConfig {
    /// Parses and validates a configuration document.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`.
    ///
    /// With no explicit path, a missing `steward.toml` yields the defaults
    /// (built-in workflows, no App).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_toml(&text, &path),
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(app) = &self.app {
            if app.id == 0 {
                return Err(ConfigError::Invalid {
                    message: "app.id must be a non-zero GitHub App id".to_string(),
                });
            }
        }
        if self.webhook.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                message: "webhook.queue_capacity must be at least 1".to_string(),
            });
        }
        workflows::ensure_unique_names(&self.workflows).map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })
    }

    /// Configured workflows, or the built-in set when none are configured.
    pub fn workflows(&self) -> Result<Vec<WorkflowDefinition>, ConfigError> {
        if self.workflows.is_empty() {
            workflows::builtin_workflows().map_err(|e| ConfigError::Invalid {
                message: e.to_string(),
            })
        } else {
            Ok(self.workflows.clone())
        }
    }

    /// The `[app]` section, for commands that talk to GitHub.
    pub fn app(&self) -> Result<&AppConfig, ConfigError> {
        self.app.as_ref().ok_or(ConfigError::MissingApp)
    }
}

impl AppConfig {
    pub fn app_id(&self) -> AppId {
        AppId::new(self.id)
    }

    /// Reads the App private key from `private_key_path`, or from the
    /// `private_key_env` environment variable.
    pub fn private_key(&self) -> Result<SecretString, ConfigError> {
        if let Some(path) = &self.private_key_path {
            let pem = std::fs::read_to_string(path).map_err(|e| ConfigError::PrivateKey {
                message: format!("failed to read '{}': {e}", path.display()),
            })?;
            return Ok(SecretString::new(pem));
        }

        read_env(&self.private_key_env)
            .map(SecretString::new)
            .ok_or_else(|| ConfigError::PrivateKey {
                message: format!(
                    "set app.private_key_path or the {} environment variable",
                    self.private_key_env
                ),
            })
    }
}

impl WebhookConfig {
    pub fn secret(&self) -> Result<SecretString, ConfigError> {
        read_env(&self.secret_env)
            .map(SecretString::new)
            .ok_or_else(|| ConfigError::WebhookSecret {
                variable: self.secret_env.clone(),
            })
    }
}
