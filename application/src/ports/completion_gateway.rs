//! Completion gateway port
//!
//! Defines the interface for asking a text-generation provider to answer the
//! newest user turn given the prior context.

use async_trait::async_trait;
use persona_chat_domain::{ContextEntry, Segment};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during a completion request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Credential missing or rejected. Fatal: the gateway cannot be used.
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited by provider")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Content blocked by provider: {0}")]
    ContentBlocked(String),

    #[error("Transient failure: {0}")]
    TransientFailure(String),
}

/// Discriminant of [`GatewayError`], used in apology turns and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayErrorKind {
    Auth,
    RateLimited,
    ContentBlocked,
    TransientFailure,
}

impl GatewayErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayErrorKind::Auth => "auth_error",
            GatewayErrorKind::RateLimited => "rate_limited",
            GatewayErrorKind::ContentBlocked => "content_blocked",
            GatewayErrorKind::TransientFailure => "transient_failure",
        }
    }
}

impl std::fmt::Display for GatewayErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl GatewayError {
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            GatewayError::Auth(_) => GatewayErrorKind::Auth,
            GatewayError::RateLimited { .. } => GatewayErrorKind::RateLimited,
            GatewayError::ContentBlocked(_) => GatewayErrorKind::ContentBlocked,
            GatewayError::TransientFailure(_) => GatewayErrorKind::TransientFailure,
        }
    }

    /// Whether repeating the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::RateLimited { .. } | GatewayError::TransientFailure(_)
        )
    }

    /// Whether the session must halt
    pub fn is_fatal(&self) -> bool {
        matches!(self, GatewayError::Auth(_))
    }
}

/// Segments returned by the provider for one reply
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub segments: Vec<Segment>,
}

impl Reply {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Single text segment reply
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Text(text.into())],
        }
    }

    /// No segments, or only blank text
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| match s {
            Segment::Text(t) => t.trim().is_empty(),
            Segment::Attachment(_) => false,
        })
    }
}

/// Gateway to a text-generation provider
///
/// Implementations (adapters) live in the infrastructure layer. A gateway is
/// a pure request/response boundary and never sees the conversation state.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Answer `new_input` given `context`, the strictly prior turns.
    ///
    /// `context` never contains `new_input` itself.
    async fn complete(
        &self,
        context: &[ContextEntry],
        new_input: &str,
    ) -> Result<Reply, GatewayError>;

    /// Verify credentials before the first exchange.
    ///
    /// Default implementation accepts unconditionally.
    async fn check_credentials(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}
