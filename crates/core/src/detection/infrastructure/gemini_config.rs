use std::env;

use thiserror::Error;

/// Environment variable holding the API access key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Model used when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY environment variable is not set")]
    MissingApiKey,
}

/// Validated client configuration.
///
/// Credential presence is checked at construction, so a missing key is
/// a typed startup error instead of a failure on the first request.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Reads the credential from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(env::var(API_KEY_ENV).unwrap_or_default())
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}
