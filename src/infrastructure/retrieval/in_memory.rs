//! In-memory hybrid retrieval index

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::domain::embedding::cosine_similarity;
use crate::domain::retrieval::{
    bm25_score, term_frequencies, tokenize, Bm25Params, IndexStats, LexicalStats, Reranker,
    RetrievalConfig, RetrievalDocument, RetrievalIndex, SearchHit,
};
use crate::domain::DomainError;
use crate::infrastructure::observability::metrics;

#[derive(Debug)]
struct IndexedDocument {
    document: RetrievalDocument,
    term_freqs: HashMap<String, u32>,
    token_count: usize,
}

impl IndexedDocument {
    fn new(document: RetrievalDocument) -> Self {
        let tokens = tokenize(&document.chunk_text);
        Self {
            term_freqs: term_frequencies(&tokens),
            token_count: tokens.len(),
            document,
        }
    }
}

/// Hybrid BM25 + cosine index held in memory
///
/// Documents sit in a sharded map; corpus statistics sit behind one RwLock
/// that writers hold while swapping a document so BM25 never sees a
/// half-applied upsert.
#[derive(Debug)]
pub struct InMemoryRetrievalIndex {
    documents: DashMap<String, Arc<IndexedDocument>>,
    lexical: RwLock<LexicalStats>,
    config: RetrievalConfig,
    reranker: Option<Arc<dyn Reranker>>,
}

impl InMemoryRetrievalIndex {
    pub fn new(config: RetrievalConfig) -> Self {
        Self {
            documents: DashMap::new(),
            lexical: RwLock::new(LexicalStats::new()),
            config,
            reranker: None,
        }
    }

    pub fn with_reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    fn bm25_params(&self) -> Bm25Params {
        Bm25Params {
            k1: self.config.bm25_k1,
            b: self.config.bm25_b,
        }
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

    /// Blend vector and normalized lexical scores for every document, best first
    fn rank_hybrid(
        &self,
        query_embedding: &[f32],
        query_text: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, DomainError> {
        let query_terms = tokenize(query_text);
        let params = self.bm25_params();

        let lexical = self.lexical.read().map_err(|e| {
            DomainError::index_degraded(format!("Failed to acquire read lock: {}", e))
        })?;

        let raw: Vec<(Arc<IndexedDocument>, f32, f32)> = self
            .documents
            .iter()
            .map(|item| {
                let doc = item.value().clone();
                let vector = cosine_similarity(query_embedding, &doc.document.embedding);
                let lexical_raw = bm25_score(
                    &query_terms,
                    &doc.term_freqs,
                    doc.token_count,
                    &lexical,
                    params,
                );
                (doc, vector, lexical_raw)
            })
            .collect();

        drop(lexical);

        let max_lexical = raw.iter().map(|(_, _, l)| *l).fold(0.0_f32, f32::max);
        let alpha = self.config.alpha;

        let mut hits: Vec<SearchHit> = raw
            .into_iter()
            .map(|(doc, vector_score, lexical_raw)| {
                let lexical_score = if max_lexical > 0.0 {
                    lexical_raw / max_lexical
                } else {
                    0.0
                };
                SearchHit {
                    document: doc.document.clone(),
                    score: alpha * vector_score + (1.0 - alpha) * lexical_score,
                    vector_score,
                    lexical_score,
                    rerank_score: None,
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.document.id.cmp(&b.document.id))
        });
        hits.truncate(limit);

        Ok(hits)
    }

    /// Reorder by reranker score; any failure keeps the hybrid order
    async fn apply_reranker(
        &self,
        reranker: &dyn Reranker,
        query_text: &str,
        hits: Vec<SearchHit>,
    ) -> Vec<SearchHit> {
        let candidates: Vec<RetrievalDocument> =
            hits.iter().map(|hit| hit.document.clone()).collect();

        match reranker.rerank(query_text, &candidates).await {
            Ok(scores) if scores.len() == hits.len() => {
                let mut reranked: Vec<SearchHit> = hits
                    .into_iter()
                    .zip(scores)
                    .map(|(mut hit, score)| {
                        hit.rerank_score = Some(score);
                        hit
                    })
                    .collect();

                reranked.sort_by(|a, b| {
                    let a_score = a.rerank_score.unwrap_or(f32::MIN);
                    let b_score = b.rerank_score.unwrap_or(f32::MIN);
                    b_score
                        .total_cmp(&a_score)
                        .then_with(|| b.score.total_cmp(&a.score))
                        .then_with(|| a.document.id.cmp(&b.document.id))
                });
                reranked
            }
            Ok(scores) => {
                metrics::record_retrieval_degraded("rerank");
                warn!(
                    expected = hits.len(),
                    got = scores.len(),
                    "Reranker returned wrong number of scores, keeping hybrid order"
                );
                hits
            }
            Err(e) => {
                metrics::record_retrieval_degraded("rerank");
                warn!("Reranker failed, keeping hybrid order: {}", e);
                hits
            }
        }
    }
}

#[async_trait]
impl RetrievalIndex for InMemoryRetrievalIndex {
    async fn index(&self, document: RetrievalDocument) -> Result<(), DomainError> {
        self.check_dimensions(&document.embedding)?;

        let id = document.id.clone();
        let indexed = Arc::new(IndexedDocument::new(document));

        let mut lexical = self.lexical.write().map_err(|e| {
            DomainError::index_degraded(format!("Failed to acquire write lock: {}", e))
        })?;

        if let Some(previous) = self.documents.insert(id.clone(), indexed.clone()) {
            lexical.remove(&previous.term_freqs, previous.token_count);
        }
        lexical.add(&indexed.term_freqs, indexed.token_count);

        debug!(document_id = %id, tokens = indexed.token_count, "Indexed document");
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, DomainError> {
        self.check_dimensions(query_embedding)?;

        if top_k == 0 || self.documents.is_empty() {
            return Ok(vec![]);
        }

        let candidate_count = match self.reranker {
            Some(_) => top_k.max(self.config.rerank_candidates),
            None => top_k,
        };

        let mut hits = self.rank_hybrid(query_embedding, query_text, candidate_count)?;

        if let Some(reranker) = &self.reranker {
            if hits.len() > 1 {
                hits = self.apply_reranker(reranker.as_ref(), query_text, hits).await;
            }
        }

        hits.truncate(top_k);
        Ok(hits)
    }

    async fn delete(&self, ids: &[String]) -> Result<usize, DomainError> {
        let mut lexical = self.lexical.write().map_err(|e| {
            DomainError::index_degraded(format!("Failed to acquire write lock: {}", e))
        })?;

        let mut removed = 0;
        for id in ids {
            if let Some((_, previous)) = self.documents.remove(id) {
                lexical.remove(&previous.term_freqs, previous.token_count);
                removed += 1;
            }
        }

        Ok(removed)
    }

    async fn stats(&self) -> Result<IndexStats, DomainError> {
        let lexical = self.lexical.read().map_err(|e| {
            DomainError::index_degraded(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(IndexStats {
            document_count: lexical.doc_count(),
            vocabulary_size: lexical.vocabulary_size(),
            avg_chunk_tokens: lexical.avg_doc_len(),
            dimensions: self.config.dimensions,
        })
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}
