//! Progress reporting while a reply is pending

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use persona_chat_application::{ExchangeProgressNotifier, GatewayErrorKind};
use persona_chat_domain::PersonaId;
use std::sync::Mutex;
use std::time::Duration;

/// Spinner shown between sending a message and receiving the reply
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn finish_message(failure: Option<GatewayErrorKind>) -> Option<String> {
        match failure {
            None => None,
            Some(GatewayErrorKind::RateLimited) => Some("rate limited".yellow().to_string()),
            Some(GatewayErrorKind::ContentBlocked) => Some("reply blocked".yellow().to_string()),
            Some(GatewayErrorKind::Auth) => Some("authentication failed".red().to_string()),
            Some(GatewayErrorKind::TransientFailure) => {
                Some("no reply received".red().to_string())
            }
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeProgressNotifier for ProgressReporter {
    fn on_awaiting_reply(&self, persona: &PersonaId) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(Self::spinner_style());
        spinner.set_message(format!("{} is thinking...", persona.as_str().bold()));
        spinner.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(previous) = slot.replace(spinner) {
                previous.finish_and_clear();
            }
        }
    }

    fn on_reply_finished(&self, failure: Option<GatewayErrorKind>) {
        let Some(spinner) = self.spinner.lock().ok().and_then(|mut slot| slot.take()) else {
            return;
        };
        match Self::finish_message(failure) {
            Some(message) => spinner.abandon_with_message(message),
            None => spinner.finish_and_clear(),
        }
    }
}
