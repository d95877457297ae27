//! Gemini connection settings from TOML (`[gemini]` section)

use crate::gemini::GeminiSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.0-pro";
pub const DEFAULT_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Raw Gemini configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGeminiConfig {
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Inline API key; takes precedence over `api_key_env`
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for FileGeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl FileGeminiConfig {
    /// Resolve the API key from the inline value or the named variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn to_settings(&self, request_timeout: Option<Duration>) -> GeminiSettings {
        GeminiSettings {
            api_key: self.resolve_api_key(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            request_timeout,
        }
    }
}
