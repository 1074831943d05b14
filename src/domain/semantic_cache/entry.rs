//! Cache entry type

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::embedding::normalize_query_text;

/// A cached response keyed by its query embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    id: String,
    query_embedding: Vec<f32>,
    normalized_query_text: String,
    response: serde_json::Value,
    created_at: DateTime<Utc>,
    ttl: Duration,
    hit_count: u64,
    last_hit_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn new(
        query_embedding: Vec<f32>,
        query_text: &str,
        response: serde_json::Value,
        ttl: Duration,
    ) -> Self {
        let normalized_query_text = normalize_query_text(query_text);

        Self {
            id: entry_id(&normalized_query_text),
            query_embedding,
            normalized_query_text,
            response,
            created_at: Utc::now(),
            ttl,
            hit_count: 0,
            last_hit_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_hit_count(mut self, hit_count: u64) -> Self {
        self.hit_count = hit_count;
        self
    }

    pub fn with_last_hit_at(mut self, last_hit_at: DateTime<Utc>) -> Self {
        self.last_hit_at = Some(last_hit_at);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn query_embedding(&self) -> &[f32] {
        &self.query_embedding
    }

    pub fn normalized_query_text(&self) -> &str {
        &self.normalized_query_text
    }

    pub fn response(&self) -> &serde_json::Value {
        &self.response
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    pub fn last_hit_at(&self) -> Option<DateTime<Utc>> {
        self.last_hit_at
    }

    /// `None` when the expiry does not fit in a timestamp (never expires)
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let ttl = TimeDelta::from_std(self.ttl).ok()?;
        self.created_at.checked_add_signed(ttl)
    }

    /// Visible for lookup only while `now < created_at + ttl`
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_none_or(|expires_at| now < expires_at)
    }

    /// Most recent access, used for least-recently-hit eviction
    pub fn last_access(&self) -> DateTime<Utc> {
        self.last_hit_at.unwrap_or(self.created_at)
    }

    pub fn record_hit(&mut self, at: DateTime<Utc>) {
        self.hit_count += 1;
        self.last_hit_at = Some(at);
    }
}

/// Stable id for a normalized query, so puts of the same text replace each other
pub fn entry_id(normalized_query_text: &str) -> String {
    let digest = Sha256::digest(normalized_query_text.as_bytes());
    format!("sem:{}", &hex::encode(digest)[..32])
}
