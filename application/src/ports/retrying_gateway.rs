//! Retry decorator for [`CompletionGateway`].
//!
//! Wraps any gateway and repeats requests that failed with a retryable error
//! (`RateLimited`, `TransientFailure`). `Auth` and `ContentBlocked` are
//! returned immediately.

use super::completion_gateway::{CompletionGateway, GatewayError, Reply};
use async_trait::async_trait;
use persona_chat_domain::ContextEntry;
use std::time::Duration;
use tracing::{debug, warn};

/// Exponential backoff settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one. `0` means a single attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each following one
    pub base_delay: Duration,
    /// Upper bound for any single delay, including provider `retry_after`
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn single_attempt() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Delay before retry number `retry` (0-based), given the failure that
    /// triggered it.
    pub fn delay_for(&self, retry: u32, error: &GatewayError) -> Duration {
        let backoff = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(retry));
        let delay = match error {
            GatewayError::RateLimited {
                retry_after: Some(after),
            } => (*after).max(backoff),
            _ => backoff,
        };
        delay.min(self.max_delay)
    }
}

/// Gateway decorator that retries retryable failures
pub struct RetryingGateway<G: CompletionGateway> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: CompletionGateway> RetryingGateway<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: CompletionGateway> CompletionGateway for RetryingGateway<G> {
    async fn complete(
        &self,
        context: &[ContextEntry],
        new_input: &str,
    ) -> Result<Reply, GatewayError> {
        let mut retry = 0;
        loop {
            match self.inner.complete(context, new_input).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_retryable() && retry < self.policy.max_retries => {
                    let delay = self.policy.delay_for(retry, &e);
                    warn!(
                        attempt = retry + 1,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Completion failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => {
                    debug!(retries = retry, "Completion failed: {}", e);
                    return Err(e);
                }
            }
        }
    }

    async fn check_credentials(&self) -> Result<(), GatewayError> {
        self.inner.check_credentials().await
    }
}
