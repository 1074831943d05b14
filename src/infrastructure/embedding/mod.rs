//! Embedding provider implementations

mod backend;
mod cached;
mod hashing;
mod openai;

pub use backend::{EmbeddingBackend, EmbeddingConfig, EmbeddingProviderKind};
pub use cached::CachedEmbeddingProvider;
pub use hashing::HashingEmbeddingProvider;
pub use openai::{OpenAiEmbeddingProvider, DEFAULT_EMBEDDING_MODEL};

// Re-export HTTP client for use by embedding providers
pub use super::llm::{HttpClient, HttpClientTrait};
