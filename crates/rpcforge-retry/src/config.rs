// SPDX-License-Identifier: MIT OR Apache-2.0
//! Retry strategy configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Caller-configurable knobs for the default retry strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Hard ceiling on attempts for a single call (the initial attempt
    /// plus retries).
    pub max_attempts: u32,
    /// Backoff base for exponential growth.
    #[serde(with = "duration_millis")]
    pub base_delay: Duration,
    /// Backoff ceiling; computed delays are capped here before jitter.
    #[serde(with = "duration_millis")]
    pub max_delay: Duration,
    /// Starting size of the retry token bucket.
    pub token_bucket_capacity: u32,
    /// Tokens withdrawn per ordinary retryable-error retry.
    pub retry_cost: u32,
    /// Tokens withdrawn per throttling-classified retry (withdrawn at a
    /// higher cost so sustained throttling exhausts the bucket faster).
    pub throttling_retry_cost: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(20),
            token_bucket_capacity: 500,
            retry_cost: 5,
            throttling_retry_cost: 10,
        }
    }
}

/// Serde helper — `Duration` as integer milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(val: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        val.as_millis().serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        let ms: u64 = u64::deserialize(de)?;
        Ok(Duration::from_millis(ms))
    }
}
