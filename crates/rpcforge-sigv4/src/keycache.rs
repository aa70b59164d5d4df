// SPDX-License-Identifier: MIT OR Apache-2.0
//! LRU cache for derived SigV4 signing keys.

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

/// Default cache capacity, per the documented implementation default.
pub const DEFAULT_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    secret_hash: [u8; 32],
    date: String,
    region: String,
    service: String,
}

/// A bounded LRU cache of derived `kSigning` keys, keyed by
/// `(secret, date, region, service)`.
///
/// The secret is hashed before it becomes part of the key so a cache dump
/// never leaks credential material. A key derived for one UTC calendar day
/// is never looked up on another — callers pass the day's date string as
/// part of the key, so a stale day simply misses and re-derives rather than
/// needing active expiry.
pub struct SigningKeyCache {
    capacity: usize,
    entries: Mutex<Vec<(CacheKey, [u8; 32])>>,
}

impl SigningKeyCache {
    /// A cache with [`DEFAULT_CAPACITY`] slots.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A cache with a caller-chosen capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Look up a cached `kSigning`, moving it to the most-recently-used
    /// position on hit.
    #[must_use]
    pub fn get(&self, secret: &str, date: &str, region: &str, service: &str) -> Option<[u8; 32]> {
        let key = Self::key(secret, date, region, service);
        let mut entries = self.entries.lock();
        let pos = entries.iter().position(|(k, _)| *k == key)?;
        let (k, v) = entries.remove(pos);
        entries.push((k, v));
        Some(v)
    }

    /// Insert a derived `kSigning`, evicting the least-recently-used entry
    /// if the cache is already at capacity.
    pub fn insert(&self, secret: &str, date: &str, region: &str, service: &str, signing_key: [u8; 32]) {
        let key = Self::key(secret, date, region, service);
        let mut entries = self.entries.lock();
        if let Some(pos) = entries.iter().position(|(k, _)| *k == key) {
            entries.remove(pos);
        } else if entries.len() >= self.capacity {
            entries.remove(0);
        }
        entries.push((key, signing_key));
    }

    /// Number of entries currently cached. Exposed for tests/diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(secret: &str, date: &str, region: &str, service: &str) -> CacheKey {
        CacheKey {
            secret_hash: Sha256::digest(secret.as_bytes()).into(),
            date: date.to_string(),
            region: region.to_string(),
            service: service.to_string(),
        }
    }
}

impl Default for SigningKeyCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_after_insert() {
        let cache = SigningKeyCache::new();
        cache.insert("secret", "20150830", "us-east-1", "iam", [7u8; 32]);
        assert_eq!(cache.get("secret", "20150830", "us-east-1", "iam"), Some([7u8; 32]));
    }

    #[test]
    fn miss_on_different_date() {
        let cache = SigningKeyCache::new();
        cache.insert("secret", "20150830", "us-east-1", "iam", [7u8; 32]);
        assert_eq!(cache.get("secret", "20150831", "us-east-1", "iam"), None);
    }

    #[test]
    fn evicts_least_recently_used_on_overflow() {
        let cache = SigningKeyCache::with_capacity(2);
        cache.insert("a", "d", "r", "s", [1u8; 32]);
        cache.insert("b", "d", "r", "s", [2u8; 32]);
        cache.insert("c", "d", "r", "s", [3u8; 32]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a", "d", "r", "s"), None);
        assert_eq!(cache.get("b", "d", "r", "s"), Some([2u8; 32]));
        assert_eq!(cache.get("c", "d", "r", "s"), Some([3u8; 32]));
    }

    #[test]
    fn get_refreshes_recency_so_it_survives_eviction() {
        let cache = SigningKeyCache::with_capacity(2);
        cache.insert("a", "d", "r", "s", [1u8; 32]);
        cache.insert("b", "d", "r", "s", [2u8; 32]);
        let _ = cache.get("a", "d", "r", "s");
        cache.insert("c", "d", "r", "s", [3u8; 32]);
        assert_eq!(cache.get("b", "d", "r", "s"), None);
        assert_eq!(cache.get("a", "d", "r", "s"), Some([1u8; 32]));
    }
}
