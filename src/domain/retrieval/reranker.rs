use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::RetrievalDocument;
use crate::domain::DomainError;

/// Cross-encoder style reranker
///
/// Returns one relevance score per candidate, in candidate order.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Reranker: Send + Sync + std::fmt::Debug {
    async fn rerank(
        &self,
        query: &str,
        candidates: &[RetrievalDocument],
    ) -> Result<Vec<f32>, DomainError>;
}
