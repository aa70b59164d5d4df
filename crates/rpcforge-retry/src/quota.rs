// SPDX-License-Identifier: MIT OR Apache-2.0
//! A bounded pool of retry tokens, shared across calls made through the
//! same strategy instance.

use parking_lot::Mutex;

/// A retry was denied because the token bucket has no capacity left —
/// sustained failures should eventually stop consuming resources retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("retry token bucket is exhausted")]
pub struct BucketExhausted;

/// A capped pool of retry "tokens". Each retry withdraws a cost; a
/// successful attempt refunds the tokens its own retries spent, so a
/// service recovering from a blip doesn't stay starved of retry budget.
pub struct TokenBucket {
    capacity: u32,
    available: Mutex<u32>,
}

impl TokenBucket {
    /// A bucket starting at full capacity.
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        Self { capacity, available: Mutex::new(capacity) }
    }

    /// Withdraw `cost` tokens, failing if the bucket doesn't have them.
    pub fn acquire(&self, cost: u32) -> Result<(), BucketExhausted> {
        let mut available = self.available.lock();
        if *available < cost {
            return Err(BucketExhausted);
        }
        *available -= cost;
        Ok(())
    }

    /// Deposit `amount` tokens back, capped at the bucket's capacity.
    pub fn release(&self, amount: u32) {
        let mut available = self.available.lock();
        *available = (*available + amount).min(self.capacity);
    }

    /// Tokens currently available. Exposed for diagnostics/tests.
    #[must_use]
    pub fn available(&self) -> u32 {
        *self.available.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_denied_when_insufficient() {
        let bucket = TokenBucket::new(10);
        assert!(bucket.acquire(5).is_ok());
        assert!(bucket.acquire(6).is_err());
        assert_eq!(bucket.available(), 5);
    }

    #[test]
    fn release_is_capped_at_capacity() {
        let bucket = TokenBucket::new(10);
        bucket.release(100);
        assert_eq!(bucket.available(), 10);
    }
}
