use crate::error::ConfigError;
use crate::llm::{DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::persona::Persona;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (`~/.parley`) - computed from home, not serialized
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,
    pub api_key: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            config_path: PathBuf::new(),
            api_key: None,
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
            session: SessionConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl Config {
    /// Directory holding transcript files. A configured `dir` wins (with `~`
    /// expanded); otherwise `<data_dir>/history`.
    pub fn history_dir(&self) -> PathBuf {
        match self.history.dir.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).into_owned()),
            None => self.data_dir.join("history"),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session.validate()?;
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::Validation("api_url must not be empty".into()));
        }
        Ok(())
    }
}

/// Generation defaults for a session. Each value can be overridden per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_response_tokens")]
    pub max_response_tokens: u32,
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,
    #[serde(default)]
    pub default_persona: Persona,
}

fn default_model() -> String {
    "gpt-3.5-turbo".into()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_response_tokens() -> u32 {
    150
}

fn default_token_budget() -> usize {
    4096
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_response_tokens: default_max_response_tokens(),
            token_budget: default_token_budget(),
            default_persona: Persona::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Validation("model must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ConfigError::Validation(format!(
                "temperature must be within [0, 1], got {}",
                self.temperature
            )));
        }
        if self.max_response_tokens == 0 {
            return Err(ConfigError::Validation(
                "max_response_tokens must be greater than 0".into(),
            ));
        }
        if self.token_budget == 0 {
            return Err(ConfigError::Validation(
                "token_budget must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Folder for transcript files; `~` is expanded.
    #[serde(default)]
    pub dir: Option<String>,
    /// Resume this file instead of starting a timestamped one.
    #[serde(default)]
    pub file: Option<String>,
}
