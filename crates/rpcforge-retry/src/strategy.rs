// SPDX-License-Identifier: MIT OR Apache-2.0
//! The default retry strategy: exponential backoff with full jitter over
//! a shared token bucket.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::trace;

use crate::classify::ErrorClassification;
use crate::config::RetryConfig;
use crate::quota::{BucketExhausted, TokenBucket};

/// Why a retry was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RetryError {
    /// The call already made `max_attempts` attempts.
    #[error("attempt ceiling ({max_attempts}) reached")]
    AttemptsExhausted {
        /// The configured ceiling.
        max_attempts: u32,
    },
    /// The strategy's token bucket has no capacity left.
    #[error(transparent)]
    BucketExhausted(#[from] BucketExhausted),
}

/// Proof that a caller is authorized to make (or retry) an attempt.
/// Opaque — callers thread it through [`RetryStrategy`] calls but don't
/// construct or inspect it directly.
#[derive(Debug, Clone, Copy)]
pub struct RetryToken {
    attempt: u32,
    cost_paid: u32,
}

impl RetryToken {
    /// The zero-indexed attempt number this token authorizes.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// Issues and refreshes [`RetryToken`]s for a call's attempt loop.
pub trait RetryStrategy: Send + Sync {
    /// Acquire the token for a call's first attempt. Free — no tokens are
    /// withdrawn for an initial attempt.
    fn acquire_initial_retry_token(&self) -> RetryToken;

    /// Exchange `token` for the next attempt's token and the backoff delay
    /// to wait before using it.
    ///
    /// # Errors
    ///
    /// [`RetryError::AttemptsExhausted`] if the call already used its
    /// attempt ceiling; [`RetryError::BucketExhausted`] if the shared
    /// token bucket has no budget left for this retry's cost.
    fn refresh_retry_token_for_retry(
        &self,
        token: RetryToken,
        classification: ErrorClassification,
    ) -> Result<(RetryToken, Duration), RetryError>;

    /// Record that the attempt authorized by `token` succeeded, refunding
    /// any tokens its prior retries spent.
    fn record_success(&self, token: RetryToken);
}

/// Exponential backoff with full jitter, gated by a [`TokenBucket`].
pub struct StandardRetryStrategy {
    config: RetryConfig,
    bucket: TokenBucket,
}

impl StandardRetryStrategy {
    /// Build a strategy from `config`, with a fresh token bucket.
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        let bucket = TokenBucket::new(config.token_bucket_capacity);
        Self { config, bucket }
    }
}

impl Default for StandardRetryStrategy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryStrategy for StandardRetryStrategy {
    fn acquire_initial_retry_token(&self) -> RetryToken {
        RetryToken { attempt: 0, cost_paid: 0 }
    }

    fn refresh_retry_token_for_retry(
        &self,
        token: RetryToken,
        classification: ErrorClassification,
    ) -> Result<(RetryToken, Duration), RetryError> {
        let next_attempt = token.attempt + 1;
        if next_attempt >= self.config.max_attempts {
            return Err(RetryError::AttemptsExhausted { max_attempts: self.config.max_attempts });
        }

        let cost = if classification.is_throttling() {
            self.config.throttling_retry_cost
        } else {
            self.config.retry_cost
        };
        self.bucket.acquire(cost)?;

        let delay = full_jitter_delay(&self.config, token.attempt);
        trace!(target: "rpcforge_retry::strategy", attempt = next_attempt, delay_ms = delay.as_millis() as u64, "retry authorized");

        Ok((RetryToken { attempt: next_attempt, cost_paid: token.cost_paid + cost }, delay))
    }

    fn record_success(&self, token: RetryToken) {
        if token.cost_paid > 0 {
            self.bucket.release(token.cost_paid);
        }
    }
}

/// `min(max_delay, base * 2^attempt)`, then a uniformly-distributed delay
/// between zero and that cap ("full jitter").
fn full_jitter_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exp = 2u64.saturating_pow(attempt);
    let capped_ms = (config.base_delay.as_millis() as u64).saturating_mul(exp).min(config.max_delay.as_millis() as u64);
    if capped_ms == 0 {
        return Duration::ZERO;
    }
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().subsec_nanos() as u64;
    let pseudo = nanos.wrapping_mul(attempt as u64 + 1);
    Duration::from_millis(pseudo % (capped_ms + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_token_is_free() {
        let strategy = StandardRetryStrategy::default();
        let token = strategy.acquire_initial_retry_token();
        assert_eq!(token.attempt(), 0);
        assert_eq!(strategy.bucket.available(), strategy.config.token_bucket_capacity);
    }

    #[test]
    fn refresh_withdraws_tokens_and_caps_delay() {
        let strategy = StandardRetryStrategy::new(RetryConfig { base_delay: Duration::from_millis(100), max_delay: Duration::from_millis(100), ..RetryConfig::default() });
        let token = strategy.acquire_initial_retry_token();
        let (token, delay) = strategy.refresh_retry_token_for_retry(token, ErrorClassification::Retryable).unwrap();
        assert_eq!(token.attempt(), 1);
        assert!(delay <= Duration::from_millis(100));
        assert!(strategy.bucket.available() < strategy.config.token_bucket_capacity);
    }

    #[test]
    fn attempts_exhausted_once_ceiling_reached() {
        let strategy = StandardRetryStrategy::new(RetryConfig { max_attempts: 1, ..RetryConfig::default() });
        let token = strategy.acquire_initial_retry_token();
        let err = strategy.refresh_retry_token_for_retry(token, ErrorClassification::Retryable).unwrap_err();
        assert!(matches!(err, RetryError::AttemptsExhausted { max_attempts: 1 }));
    }

    #[test]
    fn success_refunds_spent_tokens() {
        let strategy = StandardRetryStrategy::new(RetryConfig { token_bucket_capacity: 100, retry_cost: 5, ..RetryConfig::default() });
        let token = strategy.acquire_initial_retry_token();
        let (token, _) = strategy.refresh_retry_token_for_retry(token, ErrorClassification::Retryable).unwrap();
        assert_eq!(strategy.bucket.available(), 95);
        strategy.record_success(token);
        assert_eq!(strategy.bucket.available(), 100);
    }

    #[test]
    fn throttling_costs_more_than_ordinary_retry() {
        let strategy = StandardRetryStrategy::new(RetryConfig { token_bucket_capacity: 100, retry_cost: 5, throttling_retry_cost: 20, ..RetryConfig::default() });
        let token = strategy.acquire_initial_retry_token();
        strategy.refresh_retry_token_for_retry(token, ErrorClassification::Throttling).unwrap();
        assert_eq!(strategy.bucket.available(), 80);
    }
}
