//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for persona-chat
#[derive(Parser, Debug)]
#[command(name = "persona-chat")]
#[command(author, version, about = "Chat with a persona backed by Google Gemini")]
#[command(long_about = r#"
persona-chat holds a conversation with one of several personas (a fairy, a
puppy, a wizard, a cat, or your own). Each persona is primed with a hidden
instruction and greets you with its opening line. Switching persona starts
a fresh conversation.

The API key is read from GOOGLE_API_KEY unless configured otherwise.

Configuration files are loaded from (in priority order):
1. PERSONA_CHAT_<SECTION>__<KEY>            Environment variables
2. --config <path>                          Explicit config file
3. ./persona-chat.toml                      Project-level config
4. ~/.config/persona-chat/config.toml       Global config

Example:
  persona-chat
  persona-chat -p wizard "What is the meaning of magic?"
  persona-chat --resume 7b2276...
"#)]
pub struct Cli {
    /// Send one message and print the reply instead of starting the REPL
    pub message: Option<String>,

    /// Persona to talk to
    #[arg(short, long, value_name = "PERSONA")]
    pub persona: Option<String>,

    /// List the available personas and exit
    #[arg(long)]
    pub list_personas: bool,

    /// Resume a conversation from a token printed by /save
    #[arg(long, value_name = "TOKEN")]
    pub resume: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Also write diagnostic logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
