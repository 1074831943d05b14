//! VeriShield core
//!
//! Semantic response cache, hybrid retrieval, cost-aware model routing and
//! FinOps usage tracking behind a single HTTP surface.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::embedding::EmbeddingProvider;
use domain::retrieval::RetrievalIndex;
use domain::semantic_cache::SemanticCache;
use domain::usage::UsageTracker;
use infrastructure::{
    embedding::{CachedEmbeddingProvider, EmbeddingBackend},
    retrieval::InMemoryRetrievalIndex,
    routing::ModelRouter,
    semantic_cache::InMemorySemanticCache,
    services::{PipelineCoordinator, RetrievalService, SemanticCacheService},
    usage::InMemoryUsageTracker,
};
use tracing::info;

/// Create application state with default configuration
pub fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default())
}

/// Create application state from the given configuration
pub fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    config.validate()?;

    let backend = EmbeddingBackend::from_config(&config.embedding)?;
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(CachedEmbeddingProvider::new(
        backend,
        config.embedding.cache_ttl(),
        config.embedding.cache_capacity,
    ));

    let semantic_cache: Arc<dyn SemanticCache> =
        Arc::new(InMemorySemanticCache::new(config.cache.clone()));
    let index: Arc<dyn RetrievalIndex> =
        Arc::new(InMemoryRetrievalIndex::new(config.retrieval.clone()));

    let capabilities = config
        .router
        .models
        .iter()
        .map(|model| (model.name.clone(), model.capabilities.clone()));
    let usage: Arc<dyn UsageTracker> = Arc::new(
        InMemoryUsageTracker::new(config.usage.clone()).with_capabilities(capabilities),
    );

    let router = Arc::new(ModelRouter::from_config(&config.router)?.with_usage_tracker(usage.clone()));

    let cache = Arc::new(SemanticCacheService::new(
        semantic_cache,
        embedder.clone(),
        config.cache.clone(),
    ));
    let retrieval = Arc::new(RetrievalService::new(
        index,
        embedder.clone(),
        config.retrieval.clone(),
    ));
    let pipeline = Arc::new(PipelineCoordinator::new(
        cache.clone(),
        retrieval.clone(),
        router.clone(),
        usage.clone(),
        config.pipeline.clone(),
    ));

    info!(
        embedding_provider = embedder.provider_name(),
        dimensions = config.embedding.dimensions,
        models = config.router.models.len(),
        cache_enabled = config.cache.enabled,
        "Application state initialized"
    );

    Ok(AppState::new(cache, retrieval, pipeline, router, usage))
}
