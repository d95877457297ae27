//! Configuration file loading for persona-chat
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `PERSONA_CHAT_<SECTION>__<KEY>` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./persona-chat.toml` or `./.persona-chat.toml`
//! 4. Global: `$XDG_CONFIG_HOME/persona-chat/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL,
    FileBehaviorConfig, FileConfig, FileCustomPersona, FileGeminiConfig, FileLoggingConfig,
    FileOutputConfig, FilePersonasConfig, FileReplConfig,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
