//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to application and domain
//! types on demand.

mod behavior;
mod gemini;
mod logging;
mod output;
mod personas;
mod repl;

pub use behavior::FileBehaviorConfig;
pub use gemini::{DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL, FileGeminiConfig};
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use personas::{FileCustomPersona, FilePersonasConfig};
pub use repl::FileReplConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Provider connection
    pub gemini: FileGeminiConfig,
    /// Timeout, retries and apology text
    pub behavior: FileBehaviorConfig,
    /// Persona catalogue and startup persona
    pub personas: FilePersonasConfig,
    /// REPL settings
    pub repl: FileReplConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Structured transcript
    pub logging: FileLoggingConfig,
}

/// A configuration value that cannot be used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("behavior.timeout_seconds must be greater than zero")]
    ZeroTimeout,

    #[error("gemini.model must not be empty")]
    EmptyModel,

    #[error("gemini.base_url must not be empty")]
    EmptyBaseUrl,

    #[error("personas.custom[{index}]: {field} must not be empty")]
    BlankPersonaField { index: usize, field: &'static str },

    #[error("personas.default '{0}' does not name a known persona")]
    UnknownDefaultPersona(String),
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        if self.behavior.timeout_seconds == Some(0) {
            issues.push(ConfigValidationError::ZeroTimeout);
        }
        if self.gemini.model.trim().is_empty() {
            issues.push(ConfigValidationError::EmptyModel);
        }
        if self.gemini.base_url.trim().is_empty() {
            issues.push(ConfigValidationError::EmptyBaseUrl);
        }

        for (index, persona) in self.personas.custom.iter().enumerate() {
            for field in persona.blank_fields() {
                issues.push(ConfigValidationError::BlankPersonaField { index, field });
            }
        }

        // Only meaningful once the catalogue itself is sound
        if issues.is_empty()
            && let Some(default) = &self.personas.default
            && let Ok(registry) = self.personas.build_registry()
            && !registry.contains(default)
        {
            issues.push(ConfigValidationError::UnknownDefaultPersona(
                default.clone(),
            ));
        }

        issues
    }
}
