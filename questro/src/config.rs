//! File and environment configuration for the terminal client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use questro_client::{API_KEY_ENV, ClientConfig, ENDPOINT_ENV};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the owning user id.
pub const USER_ID_ENV: &str = "QUESTRO_USER_ID";

/// Environment variable overriding the history file location.
pub const HISTORY_ENV: &str = "QUESTRO_HISTORY";

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "questro.json";

/// Errors loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The config file is not valid JSON for [`QuestroConfig`].
    #[error("invalid config {path}: {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// A required setting is empty.
    #[error("missing setting: {0}")]
    Missing(&'static str),
    /// A setting has a value that cannot work.
    #[error("invalid setting: {0}")]
    Invalid(&'static str),
}

/// Terminal client configuration.
///
/// ```json
/// {
///   "endpoint": "https://example.supabase.co/functions/v1/chat",
///   "credential": "anon-key",
///   "user_id": "local",
///   "history_path": "questro_chat_history.json",
///   "idle_timeout_secs": 30,
///   "request_timeout_secs": 60
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestroConfig {
    /// Chat function URL.
    pub endpoint: String,
    /// Bearer credential.
    pub credential: String,
    /// Owner of the saved conversations.
    pub user_id: String,
    /// History document location.
    pub history_path: PathBuf,
    /// Seconds without a body chunk before the reply fails. `null` disables;
    /// zero is rejected.
    pub idle_timeout_secs: Option<u64>,
    /// Seconds to wait for response headers. Must be positive.
    pub request_timeout_secs: u64,
}

impl Default for QuestroConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            credential: String::new(),
            user_id: "local".to_string(),
            history_path: PathBuf::from(questro_history_fs::DEFAULT_FILE_NAME),
            idle_timeout_secs: Some(30),
            request_timeout_secs: 60,
        }
    }
}

impl QuestroConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, else `questro.json` if present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_path(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_path(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply `QUESTRO_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(endpoint) = lookup(ENDPOINT_ENV) {
            self.endpoint = endpoint;
        }
        if let Some(credential) = lookup(API_KEY_ENV) {
            self.credential = credential;
        }
        if let Some(user_id) = lookup(USER_ID_ENV) {
            self.user_id = user_id;
        }
        if let Some(path) = lookup(HISTORY_ENV) {
            self.history_path = PathBuf::from(path);
        }
    }

    /// Check that the settings needed to chat are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Missing("endpoint (set QUESTRO_ENDPOINT or --endpoint)"));
        }
        if self.user_id.trim().is_empty() {
            return Err(ConfigError::Missing("user_id"));
        }
        if self.idle_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "idle_timeout_secs must be positive (use null to disable)",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive"));
        }
        Ok(())
    }

    /// Settings for the HTTP client.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            endpoint: self.endpoint.clone(),
            credential: self.credential.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            idle_timeout: self.idle_timeout_secs.map(Duration::from_secs),
        }
    }
}
