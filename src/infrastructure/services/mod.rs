//! Application services composing the cache, index, router and usage tracker

mod pipeline;
mod retrieval_service;
mod semantic_cache_service;

pub use pipeline::{PipelineConfig, PipelineCoordinator, RagAnswer};
pub use retrieval_service::{IngestReport, RetrievalService};
pub use semantic_cache_service::{CacheSource, SemanticCacheService};
