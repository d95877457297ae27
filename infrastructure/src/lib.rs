//! Infrastructure layer for persona-chat
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod gemini;
pub mod logging;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileBehaviorConfig, FileConfig, FileCustomPersona,
    FileGeminiConfig, FileLoggingConfig, FileOutputConfig, FilePersonasConfig, FileReplConfig,
};
pub use gemini::{GeminiGateway, GeminiSettings};
pub use logging::JsonlConversationLogger;
