//! Retrieval configuration

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Configuration for hybrid retrieval and chunking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Weight of vector similarity in the blended score
    #[serde(default = "default_alpha")]
    pub alpha: f32,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Hybrid candidates handed to the reranker
    #[serde(default = "default_rerank_candidates")]
    pub rerank_candidates: usize,

    #[serde(default = "default_bm25_k1")]
    pub bm25_k1: f32,

    #[serde(default = "default_bm25_b")]
    pub bm25_b: f32,

    #[serde(default = "default_chunk_window_tokens")]
    pub chunk_window_tokens: usize,

    #[serde(default = "default_chunk_overlap_tokens")]
    pub chunk_overlap_tokens: usize,
}

fn default_alpha() -> f32 {
    0.7
}

fn default_dimensions() -> usize {
    1536
}

fn default_top_k() -> usize {
    3
}

fn default_rerank_candidates() -> usize {
    20
}

fn default_bm25_k1() -> f32 {
    1.2
}

fn default_bm25_b() -> f32 {
    0.75
}

fn default_chunk_window_tokens() -> usize {
    500
}

fn default_chunk_overlap_tokens() -> usize {
    50
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            dimensions: default_dimensions(),
            default_top_k: default_top_k(),
            rerank_candidates: default_rerank_candidates(),
            bm25_k1: default_bm25_k1(),
            bm25_b: default_bm25_b(),
            chunk_window_tokens: default_chunk_window_tokens(),
            chunk_overlap_tokens: default_chunk_overlap_tokens(),
        }
    }
}

impl RetrievalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_rerank_candidates(mut self, candidates: usize) -> Self {
        self.rerank_candidates = candidates;
        self
    }

    pub fn with_chunking(mut self, window_tokens: usize, overlap_tokens: usize) -> Self {
        self.chunk_window_tokens = window_tokens;
        self.chunk_overlap_tokens = overlap_tokens;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(DomainError::validation("alpha must be within [0, 1]"));
        }

        if self.chunk_window_tokens == 0 {
            return Err(DomainError::validation("chunk window must be positive"));
        }

        if self.chunk_overlap_tokens >= self.chunk_window_tokens {
            return Err(DomainError::validation(
                "chunk overlap must be smaller than the chunk window",
            ));
        }

        Ok(())
    }
}
