// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrent map with per-entry time-to-live.
//!
//! Eviction is TTL-only: there is no size bound and no LRU. Expired entries
//! are removed lazily by the lookup that finds them.

use std::hash::Hash;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// A concurrent key-value cache whose entries expire `ttl` after being stored.
pub struct TtlCache<K, V> {
    entries: DashMap<K, Entry<V>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Returns the live value for `key`.
    ///
    /// An entry whose age has reached the TTL is evicted and reported as absent.
    pub fn lookup(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        match self.entries.get(key) {
            None => return None,
            Some(entry) if now.duration_since(entry.stored_at) < self.ttl => {
                return Some(entry.value.clone());
            }
            Some(_) => {}
        }

        // The read guard must be released before removing from the same shard.
        self.entries
            .remove_if(key, |_, entry| now.duration_since(entry.stored_at) >= self.ttl);
        None
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn store(&self, key: K, value: V) {
        self.entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(3600);

    #[tokio::test(start_paused = true)]
    async fn entry_is_live_until_ttl() {
        let cache = TtlCache::new(TTL);
        cache.store(1u32, "a");

        assert_eq!(cache.lookup(&1), Some("a"));
        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        assert_eq!(cache.lookup(&1), Some("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_at_exactly_ttl_and_is_evicted() {
        let cache = TtlCache::new(TTL);
        cache.store(1u32, "a");

        tokio::time::advance(TTL).await;
        assert_eq!(cache.lookup(&1), None);
        assert!(cache.is_empty(), "stale entry should be evicted on lookup");
    }

    #[tokio::test(start_paused = true)]
    async fn store_replaces_and_restarts_ttl() {
        let cache = TtlCache::new(TTL);
        cache.store(1u32, "old");
        tokio::time::advance(TTL / 2).await;
        cache.store(1u32, "new");
        tokio::time::advance(TTL / 2 + Duration::from_secs(1)).await;

        assert_eq!(cache.lookup(&1), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_independently() {
        let cache = TtlCache::new(TTL);
        cache.store(1u32, "first");
        tokio::time::advance(Duration::from_secs(1800)).await;
        cache.store(2u32, "second");
        tokio::time::advance(Duration::from_secs(1800)).await;

        assert_eq!(cache.lookup(&1), None);
        assert_eq!(cache.lookup(&2), Some("second"));
    }

    #[tokio::test]
    async fn missing_key_is_absent() {
        let cache: TtlCache<u32, u32> = TtlCache::new(TTL);
        assert_eq!(cache.lookup(&42), None);
    }
}
