use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::embedding::{normalize_query_text, EmbeddingProvider};
use crate::domain::DomainError;

/// Embedding provider wrapper that memoizes vectors by normalized text
#[derive(Debug)]
pub struct CachedEmbeddingProvider<P: EmbeddingProvider> {
    inner: P,
    cache: Cache<String, Arc<Vec<f32>>>,
}

impl<P: EmbeddingProvider> CachedEmbeddingProvider<P> {
    pub fn new(inner: P, ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(capacity)
            .build();

        Self { inner, cache }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of cached vectors
    pub fn cache_size(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedEmbeddingProvider<P> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let key = normalize_query_text(text);

        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(provider = self.inner.provider_name(), "Embedding cache hit");
            return Ok((*cached).clone());
        }

        let vector = self.inner.embed(text).await?;
        self.cache.insert(key, Arc::new(vector.clone())).await;

        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let keys: Vec<String> = texts.iter().map(|text| normalize_query_text(text)).collect();
        let mut vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut missing = Vec::new();

        for (i, key) in keys.iter().enumerate() {
            match self.cache.get(key).await {
                Some(cached) => vectors.push(Some((*cached).clone())),
                None => {
                    vectors.push(None);
                    missing.push(i);
                }
            }
        }

        if !missing.is_empty() {
            let to_embed: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let embedded = self.inner.embed_batch(&to_embed).await?;

            for (i, vector) in missing.into_iter().zip(embedded) {
                self.cache.insert(keys[i].clone(), Arc::new(vector.clone())).await;
                vectors[i] = Some(vector);
            }
        }

        vectors
            .into_iter()
            .map(|vector| {
                vector.ok_or_else(|| {
                    DomainError::provider(self.inner.provider_name(), "Missing embedding in batch")
                })
            })
            .collect()
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}
