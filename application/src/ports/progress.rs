//! Progress notification port
//!
//! Defines the interface for reporting the lifecycle of an exchange so the
//! presentation layer can show a "working" indicator while a reply is pending.

use super::completion_gateway::GatewayErrorKind;
use persona_chat_domain::PersonaId;

/// Callback for progress updates during an exchange
///
/// Implementations live in the presentation layer.
pub trait ExchangeProgressNotifier: Send + Sync {
    /// Called right before the gateway is invoked
    fn on_awaiting_reply(&self, persona: &PersonaId);

    /// Called once the exchange is settled; `failure` is set when an apology
    /// turn was appended instead of a reply
    fn on_reply_finished(&self, failure: Option<GatewayErrorKind>);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ExchangeProgressNotifier for NoProgress {
    fn on_awaiting_reply(&self, _persona: &PersonaId) {}
    fn on_reply_finished(&self, _failure: Option<GatewayErrorKind>) {}
}
