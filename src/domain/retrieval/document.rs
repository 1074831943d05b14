use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An indexed, already-chunked piece of source text
///
/// Immutable once indexed; re-indexing the same id replaces the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalDocument {
    pub id: String,
    pub embedding: Vec<f32>,
    pub chunk_text: String,
    #[serde(default)]
    pub source_metadata: BTreeMap<String, String>,
}

impl RetrievalDocument {
    pub fn new(id: impl Into<String>, embedding: Vec<f32>, chunk_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            embedding,
            chunk_text: chunk_text.into(),
            source_metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.source_metadata.insert(key.into(), value.into());
        self
    }
}

/// A search result with its score components
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub document: RetrievalDocument,
    /// `alpha * vector_score + (1 - alpha) * lexical_score`
    pub score: f32,
    pub vector_score: f32,
    /// BM25 normalized to `[0, 1]` over the candidate set
    pub lexical_score: f32,
    /// Present when a reranker reordered the candidates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerank_score: Option<f32>,
}
