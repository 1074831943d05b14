//! Retrieval index domain models and traits
//!
//! Documents are pre-chunked text with an embedding; search blends cosine
//! similarity with a normalized BM25 lexical score.

mod chunker;
mod config;
mod document;
mod lexical;
mod repository;
mod reranker;

pub use chunker::{chunk_tokens, TextChunk};
pub use config::RetrievalConfig;
pub use document::{RetrievalDocument, SearchHit};
pub use lexical::{bm25_score, term_frequencies, tokenize, Bm25Params, LexicalStats};
pub use repository::{IndexStats, RetrievalIndex};
pub use reranker::Reranker;

#[cfg(test)]
pub use reranker::MockReranker;
