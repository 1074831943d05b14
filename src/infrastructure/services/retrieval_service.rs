//! Document ingestion and hybrid search over the retrieval index

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::embedding::EmbeddingProvider;
use crate::domain::retrieval::{
    chunk_tokens, IndexStats, RetrievalConfig, RetrievalDocument, RetrievalIndex, SearchHit,
};
use crate::domain::DomainError;

/// Result of ingesting one source text
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub source_id: String,
    pub chunks: usize,
    pub document_ids: Vec<String>,
}

#[derive(Debug)]
pub struct RetrievalService {
    index: Arc<dyn RetrievalIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: RetrievalConfig,
}

impl RetrievalService {
    pub fn new(
        index: Arc<dyn RetrievalIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Chunk `text` into overlapping windows, embed every chunk and index
    /// them as `{source_id}#{n}`.
    ///
    /// Each chunk carries `metadata` plus `source_id` and `chunk_index`.
    pub async fn ingest(
        &self,
        source_id: &str,
        text: &str,
        metadata: BTreeMap<String, String>,
    ) -> Result<IngestReport, DomainError> {
        let source_id = source_id.trim();
        if source_id.is_empty() {
            return Err(DomainError::validation("source_id must not be empty"));
        }

        let chunks = chunk_tokens(
            text,
            self.config.chunk_window_tokens,
            self.config.chunk_overlap_tokens,
        )?;

        if chunks.is_empty() {
            return Err(DomainError::validation("Document text must not be empty"));
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(DomainError::provider(
                self.embedder.provider_name(),
                format!("Expected {} embeddings, got {}", chunks.len(), embeddings.len()),
            ));
        }

        // Embed everything before touching the index so a failed batch leaves it unchanged
        let documents: Vec<RetrievalDocument> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                let mut document =
                    RetrievalDocument::new(format!("{}#{}", source_id, chunk.index), embedding, chunk.text);
                document.source_metadata = metadata.clone();
                document
                    .with_metadata("source_id", source_id)
                    .with_metadata("chunk_index", chunk.index.to_string())
            })
            .collect();

        let mut document_ids = Vec::with_capacity(documents.len());
        for document in documents {
            document_ids.push(document.id.clone());
            self.index.index(document).await?;
        }

        info!(source_id, chunks = document_ids.len(), "Ingested document");

        Ok(IngestReport {
            source_id: source_id.to_string(),
            chunks: document_ids.len(),
            document_ids,
        })
    }

    /// Index an already-chunked document
    pub async fn index_document(&self, document: RetrievalDocument) -> Result<(), DomainError> {
        self.index.index(document).await
    }

    /// Embed `text` and run a hybrid search; `top_k` defaults to the configured value
    pub async fn search(&self, text: &str, top_k: Option<usize>) -> Result<Vec<SearchHit>, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::validation("Query text must not be empty"));
        }

        let embedding = self.embedder.embed(text).await?;
        self.search_with_embedding(&embedding, text, top_k).await
    }

    pub async fn search_with_embedding(
        &self,
        embedding: &[f32],
        text: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<SearchHit>, DomainError> {
        let top_k = top_k.unwrap_or(self.config.default_top_k);
        let hits = self.index.search(embedding, text, top_k).await?;

        debug!(top_k, hits = hits.len(), "Retrieval search");
        Ok(hits)
    }

    pub async fn delete(&self, ids: &[String]) -> Result<usize, DomainError> {
        self.index.delete(ids).await
    }

    pub async fn stats(&self) -> Result<IndexStats, DomainError> {
        self.index.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::infrastructure::embedding::HashingEmbeddingProvider;
    use crate::infrastructure::retrieval::InMemoryRetrievalIndex;

    fn service_with(embedder: Arc<dyn EmbeddingProvider>, dimensions: usize) -> RetrievalService {
        let config = RetrievalConfig::new()
            .with_dimensions(dimensions)
            .with_chunking(8, 2);
        RetrievalService::new(
            Arc::new(InMemoryRetrievalIndex::new(config.clone())),
            embedder,
            config,
        )
    }

    fn hashing_service() -> RetrievalService {
        service_with(Arc::new(HashingEmbeddingProvider::new(128).unwrap()), 128)
    }

    #[tokio::test]
    async fn test_ingest_chunks_with_metadata() {
        let service = hashing_service();
        let text = (0..20).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let metadata = BTreeMap::from([("title".to_string(), "notes".to_string())]);

        let report = service.ingest("kb", &text, metadata).await.unwrap();

        // windows of 8 with overlap 2: [0,8) [6,14) [12,20)
        assert_eq!(report.chunks, 3);
        assert_eq!(report.document_ids, vec!["kb#0", "kb#1", "kb#2"]);

        let hits = service.search("w13 w14 w15", Some(3)).await.unwrap();
        let chunk = hits
            .iter()
            .find(|hit| hit.document.id == "kb#2")
            .unwrap();
        assert_eq!(chunk.document.source_metadata["source_id"], "kb");
        assert_eq!(chunk.document.source_metadata["chunk_index"], "2");
        assert_eq!(chunk.document.source_metadata["title"], "notes");
    }

    #[tokio::test]
    async fn test_search_prefers_matching_chunk() {
        let service = hashing_service();
        service
            .ingest("voice", "synthetic voice cloning detection on phone calls", BTreeMap::new())
            .await
            .unwrap();
        service
            .ingest("finance", "quarterly revenue report for the european market", BTreeMap::new())
            .await
            .unwrap();

        let hits = service.search("detect voice cloning", Some(1)).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.id, "voice#0");
    }

    #[tokio::test]
    async fn test_reingest_replaces_chunks() {
        let service = hashing_service();
        service.ingest("kb", "first version", BTreeMap::new()).await.unwrap();
        service.ingest("kb", "second version", BTreeMap::new()).await.unwrap();

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.document_count, 1);

        let hits = service.search("version", None).await.unwrap();
        assert_eq!(hits[0].document.chunk_text, "second version");
    }

    #[tokio::test]
    async fn test_embedding_failure_leaves_index_untouched() {
        let service = service_with(Arc::new(MockEmbeddingProvider::new("mock", 4).with_error("down")), 4);

        assert!(service.ingest("kb", "some text", BTreeMap::new()).await.is_err());
        assert_eq!(service.stats().await.unwrap().document_count, 0);
    }

    #[tokio::test]
    async fn test_validation() {
        let service = hashing_service();

        assert!(matches!(
            service.ingest(" ", "text", BTreeMap::new()).await,
            Err(DomainError::Validation { .. })
        ));
        assert!(matches!(
            service.ingest("kb", "   ", BTreeMap::new()).await,
            Err(DomainError::Validation { .. })
        ));
        assert!(matches!(
            service.search("", None).await,
            Err(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let service = hashing_service();
        service.ingest("kb", "some text", BTreeMap::new()).await.unwrap();

        let removed = service
            .delete(&["kb#0".to_string(), "missing".to_string()])
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert!(service.search("some text", None).await.unwrap().is_empty());
    }
}
