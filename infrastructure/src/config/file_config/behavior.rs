//! Exchange behavior from TOML (`[behavior]` section)

use persona_chat_application::{BehaviorConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw behavior configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBehaviorConfig {
    /// Upper bound on one exchange; `None` waits indefinitely
    pub timeout_seconds: Option<u64>,
    /// Extra attempts after a rate limit or transient failure
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    /// Replaces the default apology opening
    pub apology: Option<String>,
}

impl Default for FileBehaviorConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: Some(60),
            max_retries: 0,
            retry_base_delay_ms: 500,
            apology: None,
        }
    }
}

impl FileBehaviorConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(self.max_retries)
            .with_base_delay(Duration::from_millis(self.retry_base_delay_ms))
    }

    pub fn to_behavior_config(&self) -> BehaviorConfig {
        let behavior =
            BehaviorConfig::from_timeout_seconds(self.timeout_seconds).with_retry(self.retry_policy());
        match &self.apology {
            Some(apology) if !apology.trim().is_empty() => behavior.with_apology(apology.clone()),
            _ => behavior,
        }
    }
}
