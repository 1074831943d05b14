//! In-memory semantic cache implementation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::domain::embedding::{cosine_distance, normalize_query_text};
use crate::domain::semantic_cache::{
    compare_for_eviction, compare_matches, CacheEntry, CacheLookup, SemanticCache,
    SemanticCacheConfig, SemanticCacheStats,
};
use crate::domain::DomainError;
use crate::infrastructure::observability::metrics;

/// In-memory semantic cache using a linear similarity scan
///
/// Entries live in a sharded map so lookups and hit-count updates only lock
/// the shard they touch. Admission of new keys into a full cache is
/// serialized by a small mutex so the capacity bound holds under concurrent
/// puts; replacing an existing key never takes it.
#[derive(Debug)]
pub struct InMemorySemanticCache {
    entries: DashMap<String, CacheEntry>,
    config: SemanticCacheConfig,
    admission: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl InMemorySemanticCache {
    pub fn new(config: SemanticCacheConfig) -> Self {
        Self {
            entries: DashMap::with_capacity(config.max_entries.min(4096)),
            config,
            admission: Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SemanticCacheConfig {
        &self.config
    }

    fn check_dimensions(&self, embedding: &[f32]) -> Result<(), DomainError> {
        if embedding.len() != self.config.dimensions {
            return Err(DomainError::dimension_mismatch(
                self.config.dimensions,
                embedding.len(),
            ));
        }
        if embedding.iter().any(|value| !value.is_finite()) {
            return Err(DomainError::validation("Embedding contains non-finite values"));
        }
        Ok(())
    }

    /// Closest live entry under the threshold, cloned out of the map
    fn best_match(&self, query_embedding: &[f32], now: DateTime<Utc>) -> Option<(CacheEntry, f32)> {
        let mut best: Option<(CacheEntry, f32)> = None;

        for item in self.entries.iter() {
            let entry = item.value();

            if !entry.is_live_at(now) {
                continue;
            }

            let distance = cosine_distance(query_embedding, entry.query_embedding());
            if distance.is_nan() || distance >= self.config.distance_threshold {
                continue;
            }

            let better = match &best {
                Some((current, current_distance)) => {
                    compare_matches((entry, distance), (current, *current_distance)).is_lt()
                }
                None => true,
            };

            if better {
                best = Some((entry.clone(), distance));
            }
        }

        best
    }

    /// Remove the single best eviction candidate
    fn evict_one(&self, now: DateTime<Utc>) -> bool {
        let victim = self
            .entries
            .iter()
            .min_by(|a, b| compare_for_eviction(a.value(), b.value(), now))
            .map(|item| item.key().clone());

        match victim {
            Some(key) => {
                if self.entries.remove(&key).is_some() {
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                    metrics::record_cache_evictions(1);
                    debug!(entry_id = %key, "Evicted semantic cache entry");
                }
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl SemanticCache for InMemorySemanticCache {
    async fn lookup(
        &self,
        query_embedding: &[f32],
        query_text: &str,
    ) -> Result<CacheLookup, DomainError> {
        self.check_dimensions(query_embedding)?;

        let now = Utc::now();

        let Some((matched, distance)) = self.best_match(query_embedding, now) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            metrics::record_cache_lookup(false);
            debug!(query = %query_text, "Semantic cache miss");
            return Ok(CacheLookup::miss());
        };

        if let Some(mut entry) = self.entries.get_mut(matched.id()) {
            entry.record_hit(now);
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        metrics::record_cache_lookup(true);
        debug!(
            query = %query_text,
            matched = %matched.normalized_query_text(),
            distance,
            "Semantic cache hit"
        );

        Ok(CacheLookup::hit(
            matched.id(),
            matched.response().clone(),
            distance,
        ))
    }

    async fn peek(&self, query_embedding: &[f32]) -> Result<CacheLookup, DomainError> {
        self.check_dimensions(query_embedding)?;

        Ok(match self.best_match(query_embedding, Utc::now()) {
            Some((matched, distance)) => {
                CacheLookup::hit(matched.id(), matched.response().clone(), distance)
            }
            None => CacheLookup::miss(),
        })
    }

    async fn put(
        &self,
        query_embedding: Vec<f32>,
        query_text: &str,
        response: serde_json::Value,
        ttl: Option<Duration>,
    ) -> Result<(), DomainError> {
        self.check_dimensions(&query_embedding)?;

        let entry = CacheEntry::new(
            query_embedding,
            query_text,
            response,
            ttl.unwrap_or_else(|| self.config.ttl()),
        );
        let id = entry.id().to_string();

        if self.entries.contains_key(&id) {
            self.entries.insert(id, entry);
            return Ok(());
        }

        {
            let _admission = self.admission.lock().map_err(|e| {
                DomainError::cache_degraded(format!("Failed to acquire admission lock: {}", e))
            })?;

            if !self.entries.contains_key(&id) {
                let now = Utc::now();
                while self.entries.len() >= self.config.max_entries {
                    if !self.evict_one(now) {
                        break;
                    }
                }
            }

            self.entries.insert(id, entry);
        }

        metrics::set_cache_entries(self.entries.len());
        Ok(())
    }

    async fn invalidate(&self, pattern: &str) -> Result<usize, DomainError> {
        let pattern = pattern.trim();

        let removed = if pattern.is_empty() || pattern == "*" {
            let count = self.entries.len();
            self.entries.clear();
            count
        } else {
            let needle = normalize_query_text(pattern);
            let mut removed = 0;
            self.entries.retain(|_, entry| {
                let keep = !entry.normalized_query_text().contains(&needle);
                if !keep {
                    removed += 1;
                }
                keep
            });
            removed
        };

        metrics::set_cache_entries(self.entries.len());
        debug!(pattern, removed, "Invalidated semantic cache entries");

        Ok(removed)
    }

    async fn cleanup_expired(&self) -> Result<usize, DomainError> {
        let now = Utc::now();
        let mut removed = 0;

        self.entries.retain(|_, entry| {
            let live = entry.is_live_at(now);
            if !live {
                removed += 1;
            }
            live
        });

        if removed > 0 {
            metrics::set_cache_entries(self.entries.len());
        }

        Ok(removed)
    }

    async fn stats(&self) -> Result<SemanticCacheStats, DomainError> {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);

        let mut oldest: Option<DateTime<Utc>> = None;
        let mut newest: Option<DateTime<Utc>> = None;
        let mut entry_count = 0;

        for item in self.entries.iter() {
            let created_at = item.value().created_at();
            oldest = Some(oldest.map_or(created_at, |o| o.min(created_at)));
            newest = Some(newest.map_or(created_at, |n| n.max(created_at)));
            entry_count += 1;
        }

        Ok(SemanticCacheStats {
            hits,
            misses,
            hit_rate: SemanticCacheStats::compute_hit_rate(hits, misses),
            entry_count,
            evictions: self.evictions.load(Ordering::Relaxed),
            oldest_entry: oldest,
            newest_entry: newest,
        })
    }

    async fn reset_stats(&self) -> Result<(), DomainError> {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        Ok(())
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}

impl InMemorySemanticCache {
    /// Insert a fully built entry, bypassing admission; used to seed state in tests
    #[cfg(test)]
    fn insert_entry(&self, entry: CacheEntry) {
        self.entries.insert(entry.id().to_string(), entry);
    }

    #[cfg(test)]
    fn contains_text(&self, text: &str) -> bool {
        use crate::domain::semantic_cache::entry_id;

        self.entries
            .contains_key(&entry_id(&normalize_query_text(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use std::sync::Arc;

    fn cache(max_entries: usize) -> InMemorySemanticCache {
        InMemorySemanticCache::new(
            SemanticCacheConfig::new()
                .with_dimensions(2)
                .with_max_entries(max_entries),
        )
    }

    /// Unit vector at `degrees` from the x axis
    fn at_angle(degrees: f32) -> Vec<f32> {
        let rad = degrees.to_radians();
        vec![rad.cos(), rad.sin()]
    }

    #[tokio::test]
    async fn test_put_then_lookup_either_query_hits() {
        let cache = cache(10);
        // cos(20deg) ~= 0.94, distance ~= 0.06
        let a = at_angle(0.0);
        let b = at_angle(20.0);

        cache
            .put(a.clone(), "is this call a deepfake", serde_json::json!("answer-a"), None)
            .await
            .unwrap();

        let result = cache.lookup(&b, "is this phone call a deepfake").await.unwrap();
        assert!(result.hit);
        assert_eq!(result.response, Some(serde_json::json!("answer-a")));

        let other = InMemorySemanticCache::new(cache.config().clone());
        other
            .put(b, "is this phone call a deepfake", serde_json::json!("answer-b"), None)
            .await
            .unwrap();
        let result = other.lookup(&a, "is this call a deepfake").await.unwrap();
        assert!(result.hit);
        assert_eq!(result.response, Some(serde_json::json!("answer-b")));
    }

    #[tokio::test]
    async fn test_lookup_outside_threshold_misses() {
        let cache = cache(10);
        cache
            .put(at_angle(0.0), "alpha", serde_json::json!(1), None)
            .await
            .unwrap();

        // cos(60deg) = 0.5, distance 0.5
        let result = cache.lookup(&at_angle(60.0), "beta").await.unwrap();
        assert!(!result.hit);
        assert!(result.response.is_none());
    }

    #[tokio::test]
    async fn test_lookup_on_empty_cache_misses() {
        let cache = cache(10);
        let result = cache.lookup(&at_angle(0.0), "anything").await.unwrap();
        assert!(!result.hit);
    }

    #[tokio::test]
    async fn test_threshold_is_strict() {
        let cache = InMemorySemanticCache::new(
            SemanticCacheConfig::new()
                .with_dimensions(2)
                .with_distance_threshold(0.0),
        );
        cache
            .put(vec![1.0, 0.0], "q", serde_json::json!(1), None)
            .await
            .unwrap();

        let result = cache.lookup(&[1.0, 0.0], "q").await.unwrap();
        assert!(!result.hit);
    }

    #[tokio::test]
    async fn test_closest_entry_wins() {
        let cache = cache(10);
        cache
            .put(at_angle(0.0), "far", serde_json::json!("far"), None)
            .await
            .unwrap();
        cache
            .put(at_angle(25.0), "near", serde_json::json!("near"), None)
            .await
            .unwrap();

        let result = cache.lookup(&at_angle(22.0), "query").await.unwrap();
        assert_eq!(result.response, Some(serde_json::json!("near")));
    }

    #[tokio::test]
    async fn test_equal_distance_prefers_more_hits() {
        let cache = cache(10);
        let now = Utc::now();
        cache.insert_entry(
            CacheEntry::new(vec![0.9, 0.1], "popular", serde_json::json!("popular"), Duration::from_secs(60))
                .with_created_at(now - TimeDelta::seconds(10))
                .with_hit_count(7),
        );
        cache.insert_entry(
            CacheEntry::new(vec![0.9, -0.1], "fresh", serde_json::json!("fresh"), Duration::from_secs(60))
                .with_created_at(now),
        );

        let result = cache.lookup(&[1.0, 0.0], "query").await.unwrap();
        assert_eq!(result.response, Some(serde_json::json!("popular")));
    }

    #[tokio::test]
    async fn test_expired_entries_are_invisible() {
        let cache = cache(10);
        cache
            .put(at_angle(0.0), "old", serde_json::json!("old"), Some(Duration::ZERO))
            .await
            .unwrap();

        let result = cache.lookup(&at_angle(0.0), "old").await.unwrap();
        assert!(!result.hit);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected_without_mutation() {
        let cache = cache(10);

        let err = cache
            .put(vec![1.0, 0.0, 0.0], "q", serde_json::json!(1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DimensionMismatch { expected: 2, actual: 3 }));
        assert_eq!(cache.stats().await.unwrap().entry_count, 0);

        assert!(cache.lookup(&[1.0], "q").await.is_err());
    }

    #[tokio::test]
    async fn test_non_finite_embedding_never_hits() {
        let cache = cache(10);
        cache
            .put(vec![1.0, 0.0], "cached", serde_json::json!("cached"), None)
            .await
            .unwrap();

        let err = cache.lookup(&[f32::NAN, f32::NAN], "nan").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
        assert!(cache
            .put(vec![f32::INFINITY, 0.0], "inf", serde_json::json!(1), None)
            .await
            .is_err());
        assert!(cache.best_match(&[f32::NAN, 0.0], Utc::now()).is_none());
        assert_eq!(cache.stats().await.unwrap().entry_count, 1);
    }

    #[tokio::test]
    async fn test_peek_leaves_counters_untouched() {
        let cache = cache(10);
        cache
            .put(at_angle(0.0), "q", serde_json::json!("a"), None)
            .await
            .unwrap();

        assert!(cache.peek(&at_angle(1.0)).await.unwrap().hit);
        assert!(!cache.peek(&at_angle(90.0)).await.unwrap().hit);

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn test_hit_rate_is_exact() {
        let cache = cache(10);
        cache
            .put(at_angle(0.0), "alpha", serde_json::json!(1), None)
            .await
            .unwrap();

        for _ in 0..3 {
            assert!(cache.lookup(&at_angle(0.0), "alpha").await.unwrap().hit);
        }
        for _ in 0..5 {
            assert!(!cache.lookup(&at_angle(90.0), "other").await.unwrap().hit);
        }

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 5);
        assert_eq!(stats.hit_rate, 3.0 / 8.0);

        cache.reset_stats().await.unwrap();
        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.hit_rate, 0.0);
        assert_eq!(stats.entry_count, 1);
    }

    #[tokio::test]
    async fn test_same_text_replaces_entry() {
        let cache = cache(1);
        cache
            .put(at_angle(0.0), "Same Question", serde_json::json!("v1"), None)
            .await
            .unwrap();
        cache
            .put(at_angle(0.0), "same question", serde_json::json!("v2"), None)
            .await
            .unwrap();

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.evictions, 0);

        let result = cache.lookup(&at_angle(0.0), "same question").await.unwrap();
        assert_eq!(result.response, Some(serde_json::json!("v2")));
    }

    #[tokio::test]
    async fn test_full_cache_evicts_expired_first() {
        let cache = cache(2);
        let now = Utc::now();
        cache.insert_entry(
            CacheEntry::new(at_angle(0.0), "live", serde_json::json!(1), Duration::from_secs(3600))
                .with_created_at(now - TimeDelta::seconds(500)),
        );
        cache.insert_entry(
            CacheEntry::new(at_angle(90.0), "expired", serde_json::json!(2), Duration::from_secs(1))
                .with_created_at(now - TimeDelta::seconds(10)),
        );

        cache
            .put(at_angle(45.0), "new", serde_json::json!(3), None)
            .await
            .unwrap();

        assert!(cache.contains_text("live"));
        assert!(!cache.contains_text("expired"));
        assert!(cache.contains_text("new"));
        assert_eq!(cache.stats().await.unwrap().evictions, 1);
    }

    #[tokio::test]
    async fn test_full_cache_evicts_least_recently_hit() {
        let cache = cache(2);
        let now = Utc::now();
        cache.insert_entry(
            CacheEntry::new(at_angle(0.0), "hot", serde_json::json!(1), Duration::from_secs(3600))
                .with_created_at(now - TimeDelta::seconds(500))
                .with_last_hit_at(now - TimeDelta::seconds(1))
                .with_hit_count(4),
        );
        cache.insert_entry(
            CacheEntry::new(at_angle(90.0), "cold", serde_json::json!(2), Duration::from_secs(3600))
                .with_created_at(now - TimeDelta::seconds(100)),
        );

        cache
            .put(at_angle(45.0), "new", serde_json::json!(3), None)
            .await
            .unwrap();

        assert!(cache.contains_text("hot"));
        assert!(!cache.contains_text("cold"));
        assert_eq!(cache.stats().await.unwrap().entry_count, 2);
    }

    #[tokio::test]
    async fn test_invalidate_by_pattern_and_all() {
        let cache = cache(10);
        for (i, text) in ["deepfake audio", "Deepfake video", "invoice fraud"].iter().enumerate() {
            cache
                .put(at_angle(i as f32 * 30.0), text, serde_json::json!(i), None)
                .await
                .unwrap();
        }

        assert_eq!(cache.invalidate("DEEPFAKE").await.unwrap(), 2);
        assert_eq!(cache.stats().await.unwrap().entry_count, 1);

        assert_eq!(cache.invalidate("*").await.unwrap(), 1);
        assert_eq!(cache.stats().await.unwrap().entry_count, 0);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let cache = cache(10);
        cache
            .put(at_angle(0.0), "gone", serde_json::json!(1), Some(Duration::ZERO))
            .await
            .unwrap();
        cache
            .put(at_angle(90.0), "kept", serde_json::json!(2), None)
            .await
            .unwrap();

        assert_eq!(cache.cleanup_expired().await.unwrap(), 1);
        assert!(cache.contains_text("kept"));
    }

    #[tokio::test]
    async fn test_stats_report_entry_age_bounds() {
        let cache = cache(10);
        let now = Utc::now();
        cache.insert_entry(
            CacheEntry::new(at_angle(0.0), "a", serde_json::json!(1), Duration::from_secs(60))
                .with_created_at(now - TimeDelta::seconds(30)),
        );
        cache.insert_entry(
            CacheEntry::new(at_angle(90.0), "b", serde_json::json!(2), Duration::from_secs(60))
                .with_created_at(now),
        );

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.oldest_entry, Some(now - TimeDelta::seconds(30)));
        assert_eq!(stats.newest_entry, Some(now));
    }

    #[tokio::test]
    async fn test_concurrent_puts_respect_capacity() {
        let cache = Arc::new(cache(8));
        let mut handles = Vec::new();

        for i in 0..64 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .put(at_angle(i as f32), &format!("query {}", i), serde_json::json!(i), None)
                    .await
                    .unwrap();
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.entry_count, 8);
        assert_eq!(stats.evictions, 56);
    }
}
