//! Retrieval and generation endpoint types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::retrieval::SearchHit;

#[derive(Debug, Clone, Deserialize)]
pub struct RagSearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// A ranked chunk, without its embedding
#[derive(Debug, Clone, Serialize)]
pub struct RagSearchResult {
    pub document_id: String,
    pub chunk_text: String,
    pub score: f32,
    pub vector_score: f32,
    pub lexical_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerank_score: Option<f32>,
    pub metadata: BTreeMap<String, String>,
}

impl From<SearchHit> for RagSearchResult {
    fn from(hit: SearchHit) -> Self {
        Self {
            document_id: hit.document.id,
            chunk_text: hit.document.chunk_text,
            score: hit.score,
            vector_score: hit.vector_score,
            lexical_score: hit.lexical_score,
            rerank_score: hit.rerank_score,
            metadata: hit.document.source_metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RagSearchResponse {
    pub results: Vec<RagSearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RagGenerateRequest {
    pub query: String,
}

/// Raw text to chunk, embed and index under `source_id`
#[derive(Debug, Clone, Deserialize)]
pub struct IngestDocumentRequest {
    pub source_id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteDocumentsRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteDocumentsResponse {
    pub deleted: usize,
}
