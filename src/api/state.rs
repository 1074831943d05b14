//! Application state for shared services

use std::sync::Arc;

use crate::domain::usage::UsageTracker;
use crate::infrastructure::routing::ModelRouter;
use crate::infrastructure::services::{PipelineCoordinator, RetrievalService, SemanticCacheService};

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<SemanticCacheService>,
    pub retrieval: Arc<RetrievalService>,
    pub pipeline: Arc<PipelineCoordinator>,
    pub router: Arc<ModelRouter>,
    pub usage: Arc<dyn UsageTracker>,
}

impl AppState {
    pub fn new(
        cache: Arc<SemanticCacheService>,
        retrieval: Arc<RetrievalService>,
        pipeline: Arc<PipelineCoordinator>,
        router: Arc<ModelRouter>,
        usage: Arc<dyn UsageTracker>,
    ) -> Self {
        Self {
            cache,
            retrieval,
            pipeline,
            router,
            usage,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cache_enabled", &self.cache.is_enabled())
            .field("models", &self.router.catalog().len())
            .finish()
    }
}
