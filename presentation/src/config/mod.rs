//! Presentation-level configuration
//!
//! Configuration for output formatting and REPL behavior.

use std::path::PathBuf;

/// Output configuration for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

impl OutputConfig {
    /// Apply the colour preference process-wide.
    pub fn apply(&self) {
        if !self.color {
            colored::control::set_override(false);
        }
    }
}

/// REPL configuration for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplConfig {
    /// Show a spinner while a reply is pending
    pub show_progress: bool,
    /// Path to history file; `~/` is expanded
    pub history_file: Option<String>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: None,
        }
    }
}

impl ReplConfig {
    /// Resolved history file, defaulting to `<data dir>/persona-chat/history.txt`
    pub fn history_path(&self) -> Option<PathBuf> {
        match &self.history_file {
            Some(path) => match path.strip_prefix("~/") {
                Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
                None => Some(PathBuf::from(path)),
            },
            None => dirs::data_dir().map(|d| d.join("persona-chat").join("history.txt")),
        }
    }
}
