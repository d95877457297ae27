//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::ConsoleFormatter;
use crate::ProgressReporter;
use colored::Colorize;
use persona_chat_application::{CompletionGateway, GatewayError, TurnController, TurnError};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Reasons the REPL stops before the user quits
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Line editor failed: {0}")]
    Readline(#[from] ReadlineError),

    /// The provider can no longer be used
    #[error(transparent)]
    Fatal(GatewayError),
}

/// A slash command typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Personas,
    /// `/persona` alone shows the active persona
    Persona(Option<String>),
    History,
    Reset,
    Save,
    Load(Option<String>),
    Quit,
    Unknown(String),
}

impl ReplCommand {
    /// Parse a line starting with `/`.
    pub fn parse(line: &str) -> Self {
        let mut parts = line.trim().splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let arg = parts
            .next()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        match name {
            "/help" | "/h" | "/?" => ReplCommand::Help,
            "/personas" => ReplCommand::Personas,
            "/persona" | "/p" => ReplCommand::Persona(arg),
            "/history" => ReplCommand::History,
            "/reset" => ReplCommand::Reset,
            "/save" => ReplCommand::Save,
            "/load" | "/resume" => ReplCommand::Load(arg),
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            other => ReplCommand::Unknown(other.to_string()),
        }
    }
}

/// Interactive chat REPL
pub struct ChatRepl<G: CompletionGateway + 'static> {
    controller: Arc<TurnController<G>>,
    show_progress: bool,
    history_path: Option<PathBuf>,
}

impl<G: CompletionGateway + 'static> ChatRepl<G> {
    /// Create a new ChatRepl
    pub fn new(controller: Arc<TurnController<G>>) -> Self {
        Self {
            controller,
            show_progress: true,
            history_path: None,
        }
    }

    /// Set whether to show progress
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Set where line-editor history is kept
    pub fn with_history_path(mut self, path: Option<PathBuf>) -> Self {
        self.history_path = path;
        self
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> Result<(), ChatError> {
        let mut rl = DefaultEditor::new()?;

        if let Some(ref path) = self.history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        let result = loop {
            let prompt = format!("{}> ", self.controller.active_persona());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(line);

                    if line.starts_with('/') {
                        if self.handle_command(ReplCommand::parse(line)) {
                            break Ok(());
                        }
                        continue;
                    }

                    if let Err(e) = self.send(line).await {
                        break Err(e);
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break Ok(());
                }
                Err(err) => break Err(ChatError::Readline(err)),
            }
        };

        if let Some(ref path) = self.history_path
            && let Err(e) = rl.save_history(path)
        {
            debug!("Could not save REPL history to {}: {}", path.display(), e);
        }

        result
    }

    fn speaker(&self) -> String {
        let active = self.controller.active_persona();
        self.controller
            .registry()
            .get(active.as_str())
            .map(|p| p.display_name().to_string())
            .unwrap_or_else(|_| active.to_string())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", ConsoleFormatter::header("persona-chat"));
        println!();
        println!("Type a message to talk, or /help for commands.");
        println!();
        self.print_history();
    }

    fn print_help() {
        println!();
        println!("Commands:");
        println!("  /help, /h, /?      - Show this help");
        println!("  /personas          - List personas");
        println!("  /persona <id>      - Switch persona (starts a new conversation)");
        println!("  /history           - Show the conversation so far");
        println!("  /reset             - Start over with the current persona");
        println!("  /save              - Print a token that restores this conversation");
        println!("  /load <token>      - Restore a saved conversation");
        println!("  /quit, /exit, /q   - Exit chat");
        println!();
    }

    fn print_history(&self) {
        let history = self.controller.rendered_history();
        println!("{}", ConsoleFormatter::format_history(&history, &self.speaker()));
        println!();
    }

    fn print_error(error: &TurnError) {
        eprintln!("{} {}", "Error:".red().bold(), error);
    }

    /// Handle slash commands. Returns true if should exit.
    fn handle_command(&self, cmd: ReplCommand) -> bool {
        match cmd {
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
            ReplCommand::Help => Self::print_help(),
            ReplCommand::Personas => {
                let active = self.controller.active_persona();
                println!(
                    "{}",
                    ConsoleFormatter::format_personas(self.controller.registry(), Some(&active))
                );
            }
            ReplCommand::Persona(None) => {
                println!("Talking to {}", self.speaker().bold());
            }
            ReplCommand::Persona(Some(id)) => match self.controller.switch_persona(&id) {
                Ok(true) => {
                    println!();
                    self.print_history();
                }
                Ok(false) => println!("Already talking to {}", self.speaker().bold()),
                Err(e) => {
                    Self::print_error(&e);
                    println!("Type /personas to see who is available");
                }
            },
            ReplCommand::History => {
                println!();
                self.print_history();
            }
            ReplCommand::Reset => match self.controller.reset() {
                Ok(()) => {
                    println!();
                    self.print_history();
                }
                Err(e) => Self::print_error(&e),
            },
            ReplCommand::Save => match self.controller.save() {
                Ok(saved) => println!("{}", ConsoleFormatter::format_saved(&saved)),
                Err(e) => Self::print_error(&e),
            },
            ReplCommand::Load(None) => println!("Usage: /load <token>"),
            ReplCommand::Load(Some(token)) => match self.controller.resume(&token) {
                Ok(()) => {
                    println!();
                    self.print_history();
                }
                Err(e) => Self::print_error(&e),
            },
            ReplCommand::Unknown(name) => {
                println!("Unknown command: {}", name);
                println!("Type /help for available commands");
            }
        }
        false
    }

    async fn send(&self, text: &str) -> Result<(), ChatError> {
        println!();

        let result = if self.show_progress {
            let progress = ProgressReporter::new();
            self.controller.submit_with_progress(text, &progress).await
        } else {
            self.controller.submit(text).await
        };

        match result {
            Ok(outcome) => {
                println!(
                    "{}",
                    ConsoleFormatter::format_turn(outcome.turn(), &self.speaker())
                );
            }
            Err(TurnError::Fatal(e)) => return Err(ChatError::Fatal(e)),
            Err(e) => Self::print_error(&e),
        }
        println!();
        Ok(())
    }
}
