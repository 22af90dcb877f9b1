// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media handle cache keyed by episode id.

use std::sync::Arc;
use std::time::Duration;

use amanogawa_core::{EpisodeId, MediaHandle, TtlCache};
use tracing::debug;

/// Resolved handles by episode id, expiring `ttl` after resolution.
///
/// Handles are stored behind `Arc` and never mutated; a re-resolution stores
/// a fresh handle in place of the expired one.
pub struct MediaCache<M> {
    entries: TtlCache<EpisodeId, Arc<MediaHandle<M>>>,
}

impl<M> MediaCache<M> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: TtlCache::new(ttl),
        }
    }

    pub fn lookup(&self, episode_id: EpisodeId) -> Option<Arc<MediaHandle<M>>> {
        let hit = self.entries.lookup(&episode_id);
        let outcome = if hit.is_some() { "hit" } else { "miss" };
        metrics::counter!("amanogawa_cache_lookups_total", "outcome" => outcome).increment(1);
        debug!(%episode_id, outcome, "media cache lookup");
        hit
    }

    /// Like [`lookup`](Self::lookup) but without counting toward cache metrics.
    pub(crate) fn peek(&self, episode_id: EpisodeId) -> Option<Arc<MediaHandle<M>>> {
        self.entries.lookup(&episode_id)
    }

    pub fn store(&self, episode_id: EpisodeId, handle: Arc<MediaHandle<M>>) {
        self.entries.store(episode_id, handle);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use amanogawa_core::RemoteMedia;
    use metrics_exporter_prometheus::PrometheusBuilder;

    use super::*;

    fn handle(episode: i64) -> Arc<MediaHandle<()>> {
        Arc::new(MediaHandle::new(
            EpisodeId(episode),
            episode * 10,
            RemoteMedia {
                inner: (),
                size_bytes: Some(1024),
                mime_type: None,
            },
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn hit_within_ttl_miss_at_ttl() {
        let ttl = Duration::from_secs(3600);
        let cache = MediaCache::new(ttl);
        let stored = handle(5);
        cache.store(EpisodeId(5), Arc::clone(&stored));

        tokio::time::advance(ttl - Duration::from_secs(1)).await;
        let hit = cache.lookup(EpisodeId(5)).expect("entry should be live");
        assert!(Arc::ptr_eq(&hit, &stored));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.lookup(EpisodeId(5)).is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restore_replaces_handle() {
        let cache = MediaCache::new(Duration::from_secs(60));
        cache.store(EpisodeId(1), handle(1));
        let fresh = handle(1);
        cache.store(EpisodeId(1), Arc::clone(&fresh));

        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&cache.lookup(EpisodeId(1)).unwrap(), &fresh));
    }

    #[test]
    fn peek_is_not_counted() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let metrics = recorder.handle();
        let cache = MediaCache::new(Duration::from_secs(60));

        metrics::with_local_recorder(&recorder, || {
            assert!(cache.lookup(EpisodeId(3)).is_none());
            assert!(cache.peek(EpisodeId(3)).is_none());
            cache.store(EpisodeId(3), handle(3));
            assert!(cache.peek(EpisodeId(3)).is_some());
        });

        let text = metrics.render();
        assert!(text.contains(r#"amanogawa_cache_lookups_total{outcome="miss"} 1"#));
        assert!(!text.contains(r#"outcome="hit""#));
    }
}
