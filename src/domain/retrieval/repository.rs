use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{RetrievalDocument, SearchHit};
use crate::domain::DomainError;

/// Size statistics of an index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub document_count: usize,
    pub vocabulary_size: usize,
    /// Average chunk length in tokens
    pub avg_chunk_tokens: f32,
    pub dimensions: usize,
}

/// Hybrid vector + lexical document index
#[async_trait]
pub trait RetrievalIndex: Send + Sync + Debug {
    /// Upsert by id. A dimension mismatch fails without touching the index.
    async fn index(&self, document: RetrievalDocument) -> Result<(), DomainError>;

    /// Top `top_k` documents by descending score, ties by ascending id.
    /// An empty index yields an empty list.
    async fn search(
        &self,
        query_embedding: &[f32],
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, DomainError>;

    /// Remove documents by id, returning how many existed
    async fn delete(&self, ids: &[String]) -> Result<usize, DomainError>;

    async fn stats(&self) -> Result<IndexStats, DomainError>;

    fn dimensions(&self) -> usize;
}
