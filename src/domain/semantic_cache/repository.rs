//! Semantic cache trait and types

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Outcome of a similarity lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheLookup {
    pub hit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    /// Cosine distance to the matched entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
}

impl CacheLookup {
    pub fn miss() -> Self {
        Self {
            hit: false,
            response: None,
            distance: None,
            entry_id: None,
        }
    }

    pub fn hit(entry_id: impl Into<String>, response: serde_json::Value, distance: f32) -> Self {
        Self {
            hit: true,
            response: Some(response),
            distance: Some(distance),
            entry_id: Some(entry_id.into()),
        }
    }
}

/// Statistics for the semantic cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub entry_count: usize,
    pub evictions: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_entry: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_entry: Option<DateTime<Utc>>,
}

impl SemanticCacheStats {
    /// `hits / (hits + misses)`, zero before the first lookup
    pub fn compute_hit_rate(hits: u64, misses: u64) -> f64 {
        let total = hits + misses;

        if total == 0 {
            return 0.0;
        }

        hits as f64 / total as f64
    }
}

/// Trait for semantic (vector-based) response caches
#[async_trait]
pub trait SemanticCache: Send + Sync + Debug {
    /// Closest live entry strictly below the distance threshold
    async fn lookup(&self, query_embedding: &[f32], query_text: &str)
        -> Result<CacheLookup, DomainError>;

    /// Same match as `lookup` without counting it or touching hit counts
    async fn peek(&self, query_embedding: &[f32]) -> Result<CacheLookup, DomainError>;

    /// Insert or replace the entry for `query_text`, evicting when full.
    /// `ttl` falls back to the configured default.
    async fn put(
        &self,
        query_embedding: Vec<f32>,
        query_text: &str,
        response: serde_json::Value,
        ttl: Option<Duration>,
    ) -> Result<(), DomainError>;

    /// Remove entries whose normalized query contains `pattern` (`*` or empty = all)
    async fn invalidate(&self, pattern: &str) -> Result<usize, DomainError>;

    /// Drop expired entries, returning how many were removed
    async fn cleanup_expired(&self) -> Result<usize, DomainError>;

    async fn stats(&self) -> Result<SemanticCacheStats, DomainError>;

    /// Zero the hit/miss counters
    async fn reset_stats(&self) -> Result<(), DomainError>;

    /// Configured embedding dimension
    fn dimensions(&self) -> usize;
}
