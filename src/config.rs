//! Run configuration.
//!
//! Credential, endpoint, model, input file and prompt live in one [`Config`]
//! that is handed to the driver. Values come from the environment (with `.env`
//! support) and can be overridden through [`ConfigBuilder`].

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::client::consts::{BASE_URL, DEFAULT_MODEL, OPENAI_API_KEY};
use crate::instructions::{DEFAULT_LANGUAGE, DEFAULT_PROMPT};

pub const REALTIME_BASE_URL: &str = "REALTIME_BASE_URL";
pub const REALTIME_MODEL: &str = "REALTIME_MODEL";
pub const COACH_LANGUAGE: &str = "COACH_LANGUAGE";
pub const COACH_TIMEOUT_SECS: &str = "COACH_TIMEOUT_SECS";

/// Recording analysed when no path is given.
pub const DEFAULT_AUDIO_FILE: &str = "recording.wav";
/// Capacity of the outbound and inbound frame queues.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

#[derive(Debug)]
pub struct Config {
    base_url: String,
    api_key: SecretString,
    model: String,
    audio_path: PathBuf,
    prompt: String,
    language: String,
    response_timeout: Option<Duration>,
    capacity: usize,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Loads configuration from environment variables.
    ///
    // *   `OPENAI_API_KEY`: Bearer credential for the realtime endpoint. Required.
    // *   `REALTIME_BASE_URL`: (Optional) Websocket base URL. Defaults to "wss://api.openai.com/v1".
    // *   `REALTIME_MODEL`: (Optional) Realtime model identifier.
    // *   `COACH_LANGUAGE`: (Optional) Language the critique is written in. Defaults to Chinese.
    // *   `COACH_TIMEOUT_SECS`: (Optional) Give up when no response text arrives in time.
    pub fn from_env() -> Result<Self, ConfigError> {
        ConfigBuilder::from_env()?.build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn audio_path(&self) -> &Path {
        &self.audio_path
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Full websocket URL including the model query.
    pub fn url(&self) -> String {
        format!("{}/realtime?model={}", self.base_url.trim_end_matches('/'), self.model)
    }
}

pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config {
                base_url: BASE_URL.to_string(),
                api_key: SecretString::from(String::new()),
                model: DEFAULT_MODEL.to_string(),
                audio_path: PathBuf::from(DEFAULT_AUDIO_FILE),
                prompt: DEFAULT_PROMPT.to_string(),
                language: DEFAULT_LANGUAGE.to_string(),
                response_timeout: None,
                capacity: DEFAULT_CHANNEL_CAPACITY,
            },
        }
    }

    /// Seeds a builder from the environment. The `.env` file is loaded first and
    /// is ignored if not present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = Self::new();
        if let Ok(api_key) = env::var(OPENAI_API_KEY) {
            builder = builder.with_api_key(&api_key);
        }
        if let Ok(base_url) = env::var(REALTIME_BASE_URL) {
            builder = builder.with_base_url(&base_url);
        }
        if let Ok(model) = env::var(REALTIME_MODEL) {
            builder = builder.with_model(&model);
        }
        if let Ok(language) = env::var(COACH_LANGUAGE) {
            builder = builder.with_language(&language);
        }
        if let Ok(value) = env::var(COACH_TIMEOUT_SECS) {
            let secs = value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                name: COACH_TIMEOUT_SECS.to_string(),
                value: value.clone(),
            })?;
            builder = builder.with_response_timeout(Duration::from_secs(secs));
        }
        Ok(builder)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.config.api_key = SecretString::from(api_key.to_string());
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.config.model = model.to_string();
        self
    }

    pub fn with_audio_path(mut self, audio_path: impl Into<PathBuf>) -> Self {
        self.config.audio_path = audio_path.into();
        self
    }

    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.config.prompt = prompt.to_string();
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.config.language = language.to_string();
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.config.response_timeout = Some(timeout);
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity.max(1);
        self
    }

    /// Finishes the configuration. A run without a credential is refused here,
    /// before anything touches the network.
    pub fn build(self) -> Result<Config, ConfigError> {
        if self.config.api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::MissingVar(OPENAI_API_KEY.to_string()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_overrides() {
        let config = Config::builder()
            .with_api_key("sk-test")
            .with_base_url("wss://proxy.example/v1/")
            .with_model("gpt-4o-realtime-preview")
            .with_audio_path("clip.wav")
            .with_prompt("rate me")
            .with_language("English")
            .with_response_timeout(Duration::from_secs(60))
            .build()
            .unwrap();

        assert_eq!(config.api_key().expose_secret(), "sk-test");
        assert_eq!(
            config.url(),
            "wss://proxy.example/v1/realtime?model=gpt-4o-realtime-preview"
        );
        assert_eq!(config.audio_path(), Path::new("clip.wav"));
        assert_eq!(config.prompt(), "rate me");
        assert_eq!(config.language(), "English");
        assert_eq!(config.response_timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn defaults_match_the_realtime_endpoint() {
        let config = Config::builder().with_api_key("sk-test").build().unwrap();

        assert_eq!(config.base_url(), BASE_URL);
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.prompt(), DEFAULT_PROMPT);
        assert_eq!(config.language(), DEFAULT_LANGUAGE);
        assert_eq!(config.audio_path(), Path::new(DEFAULT_AUDIO_FILE));
        assert!(config.response_timeout().is_none());
        assert_eq!(config.capacity(), DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let result = Config::builder().with_api_key("   ").build();
        assert!(matches!(result, Err(ConfigError::MissingVar(_))));
    }
}
