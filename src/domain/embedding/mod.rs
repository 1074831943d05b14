//! Embedding provider domain models and traits

mod provider;
mod vector;

pub use provider::EmbeddingProvider;
pub use vector::{cosine_distance, cosine_similarity, normalize_query_text};

#[cfg(test)]
pub use provider::mock::MockEmbeddingProvider;
