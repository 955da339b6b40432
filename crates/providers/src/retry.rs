//! Retrying completion client — randomized exponential backoff.
//!
//! Wraps any [`CompletionClient`] and re-issues failed requests. The delay
//! before retry `n` is drawn uniformly from `[0, min(multiplier * 2^(n-1), max_delay)]`
//! ("full jitter"), so concurrent agents hitting the same rate limit spread out.

use agentflow_config::RetryConfig;
use agentflow_core::error::ProviderError;
use agentflow_core::provider::*;
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Upper bound of the backoff window before retry number `retry` (1-based).
    pub fn ceiling(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.multiplier.saturating_mul(factor).min(self.max_delay)
    }

    /// A random delay in `[0, ceiling(retry)]`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let ceiling_ms = self.ceiling(retry).as_millis() as u64;
        if ceiling_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=ceiling_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: Duration::from_secs(1),
            max_delay: Duration::from_secs(40),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            multiplier: Duration::from_millis(config.multiplier_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

/// A client that retries its inner client according to a [`RetryPolicy`].
pub struct RetryingClient {
    inner: Arc<dyn CompletionClient>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn CompletionClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl CompletionClient for RetryingClient {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ProviderError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.inner.complete(request.clone()).await {
                Ok(completion) => {
                    if attempt > 1 {
                        debug!(connection = %self.inner.name(), attempt, "Completion succeeded after retry");
                    }
                    return Ok(completion);
                }
                Err(e) if attempt >= max_attempts => {
                    warn!(
                        connection = %self.inner.name(),
                        attempts = attempt,
                        error = %e,
                        "Completion failed, giving up"
                    );
                    return Err(ProviderError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        connection = %self.inner.name(),
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Completion failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
