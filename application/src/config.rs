//! Application-level configuration.
//!
//! Controls how the turn controller talks to the completion gateway.

use crate::ports::retrying_gateway::RetryPolicy;
use std::time::Duration;

/// Default opening of the apology turn appended when an exchange fails
pub const DEFAULT_APOLOGY: &str = "Sorry, something went wrong while I was replying";

/// Application behavior configuration.
#[derive(Debug, Clone)]
pub struct BehaviorConfig {
    /// Maximum time to wait for a reply before the exchange fails with a
    /// transient failure.
    pub timeout: Option<Duration>,
    /// Retry policy for the gateway decorator
    pub retry: RetryPolicy,
    /// Opening of the apology turn; the error kind and detail follow it
    pub apology: String,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            retry: RetryPolicy::default(),
            apology: DEFAULT_APOLOGY.to_string(),
        }
    }
}

impl BehaviorConfig {
    /// Creates a BehaviorConfig with a timeout specified in seconds.
    pub fn with_timeout_seconds(seconds: u64) -> Self {
        Self {
            timeout: Some(Duration::from_secs(seconds)),
            ..Self::default()
        }
    }

    /// Creates a BehaviorConfig from an optional timeout in seconds.
    ///
    /// If `seconds` is `None`, no timeout is applied.
    pub fn from_timeout_seconds(seconds: Option<u64>) -> Self {
        Self {
            timeout: seconds.map(Duration::from_secs),
            ..Self::default()
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_apology(mut self, apology: impl Into<String>) -> Self {
        self.apology = apology.into();
        self
    }
}
