//! Application layer for persona-chat
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{BehaviorConfig, DEFAULT_APOLOGY};
pub use ports::{
    completion_gateway::{CompletionGateway, GatewayError, GatewayErrorKind, Reply},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    progress::{ExchangeProgressNotifier, NoProgress},
    retrying_gateway::{RetryPolicy, RetryingGateway},
};
pub use use_cases::turn_controller::{ExchangeOutcome, ExchangePhase, TurnController, TurnError};
