//! Semantic response cache service
//!
//! Embeds query text, looks it up in the semantic cache and coalesces
//! concurrent misses for equivalent queries into a single computation.
//! Cache failures degrade to a miss instead of failing the caller.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::embedding::EmbeddingProvider;
use crate::domain::semantic_cache::{
    CacheLookup, SemanticCache, SemanticCacheConfig, SemanticCacheStats,
};
use crate::domain::DomainError;
use crate::infrastructure::observability::metrics;
use crate::infrastructure::semantic_cache::SingleFlight;

/// Where a `get_or_compute` result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    Hit,
    /// Joined another caller's in-flight computation
    Coalesced,
    Computed,
}

#[derive(Debug)]
pub struct SemanticCacheService {
    cache: Arc<dyn SemanticCache>,
    embedder: Arc<dyn EmbeddingProvider>,
    flights: SingleFlight<serde_json::Value>,
    config: SemanticCacheConfig,
}

impl SemanticCacheService {
    pub fn new(
        cache: Arc<dyn SemanticCache>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: SemanticCacheConfig,
    ) -> Self {
        Self {
            flights: SingleFlight::new(config.distance_threshold),
            cache,
            embedder,
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn cache(&self) -> &Arc<dyn SemanticCache> {
        &self.cache
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        self.embedder.embed(text).await
    }

    /// Lookup-only query; never computes or stores anything
    pub async fn query(&self, text: &str) -> Result<CacheLookup, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::validation("Query text must not be empty"));
        }

        if !self.config.enabled {
            return Ok(CacheLookup::miss());
        }

        match self.embedder.embed(text).await {
            Ok(embedding) => Ok(self.lookup(&embedding, text).await),
            Err(e) => {
                metrics::record_cache_degraded("embed");
                warn!("Failed to embed query for cache lookup: {}", e);
                Ok(CacheLookup::miss())
            }
        }
    }

    /// Lookup that treats cache failures as a miss
    pub async fn lookup(&self, embedding: &[f32], text: &str) -> CacheLookup {
        if !self.config.enabled {
            return CacheLookup::miss();
        }

        match self.cache.lookup(embedding, text).await {
            Ok(lookup) => lookup,
            Err(e) => {
                metrics::record_cache_degraded("lookup");
                warn!("Semantic cache lookup failed, treating as miss: {}", e);
                CacheLookup::miss()
            }
        }
    }

    /// Counter-free lookup used to re-check the cache once a flight is led
    async fn peek(&self, embedding: &[f32]) -> CacheLookup {
        match self.cache.peek(embedding).await {
            Ok(lookup) => lookup,
            Err(e) => {
                metrics::record_cache_degraded("lookup");
                warn!("Semantic cache re-check failed, treating as miss: {}", e);
                CacheLookup::miss()
            }
        }
    }

    /// Store a response, logging instead of failing when the cache rejects it
    pub async fn store(&self, embedding: Vec<f32>, text: &str, response: serde_json::Value) {
        if !self.config.enabled {
            return;
        }

        if let Err(e) = self.cache.put(embedding, text, response, None).await {
            metrics::record_cache_degraded("put");
            warn!("Failed to populate semantic cache: {}", e);
        }
    }

    /// Serve from cache, or run `compute` once for all concurrent equivalent
    /// queries and cache its successful result.
    pub async fn get_or_compute<F, Fut>(
        &self,
        embedding: Vec<f32>,
        text: &str,
        cancel: &CancellationToken,
        compute: F,
    ) -> Result<(serde_json::Value, CacheSource), DomainError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<serde_json::Value, DomainError>>,
    {
        if !self.config.enabled {
            return compute().await.map(|value| (value, CacheSource::Computed));
        }

        let lookup = self.lookup(&embedding, text).await;
        if let (true, Some(response)) = (lookup.hit, lookup.response) {
            debug!(distance = ?lookup.distance, "Serving response from semantic cache");
            return Ok((response, CacheSource::Hit));
        }

        let mut led = false;
        let stored_meanwhile = AtomicBool::new(false);
        let value = self
            .flights
            .run(&embedding, cancel, || {
                led = true;
                async {
                    // An equivalent flight may have stored its result after the
                    // lookup above missed
                    let recheck = self.peek(&embedding).await;
                    if let (true, Some(response)) = (recheck.hit, recheck.response) {
                        stored_meanwhile.store(true, Ordering::Relaxed);
                        return Ok(response);
                    }

                    let value = compute().await?;
                    self.store(embedding.clone(), text, value.clone()).await;
                    Ok::<_, DomainError>(value)
                }
            })
            .await?;

        let source = if stored_meanwhile.load(Ordering::Relaxed) {
            CacheSource::Hit
        } else if led {
            CacheSource::Computed
        } else {
            CacheSource::Coalesced
        };

        Ok((value, source))
    }

    /// Pre-populate the cache with known query/response pairs
    pub async fn warmup(&self, pairs: Vec<(String, serde_json::Value)>) -> Result<usize, DomainError> {
        if !self.config.enabled || pairs.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = pairs.iter().map(|(text, _)| text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let mut stored = 0;
        for ((text, response), embedding) in pairs.into_iter().zip(embeddings) {
            match self.cache.put(embedding, &text, response, None).await {
                Ok(()) => stored += 1,
                Err(e) => warn!("Skipping warmup entry: {}", e),
            }
        }

        debug!(stored, "Semantic cache warmed up");
        Ok(stored)
    }

    pub async fn invalidate(&self, pattern: &str) -> Result<usize, DomainError> {
        self.cache.invalidate(pattern).await
    }

    pub async fn stats(&self) -> Result<SemanticCacheStats, DomainError> {
        self.cache.stats().await
    }

    pub async fn reset_stats(&self) -> Result<(), DomainError> {
        self.cache.reset_stats().await
    }
}
