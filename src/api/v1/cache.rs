//! Semantic cache endpoint handlers

use axum::extract::State;
use tracing::{debug, info};

use crate::api::state::AppState;
use crate::api::types::{
    ApiError, CacheInvalidateRequest, CacheInvalidateResponse, CacheQueryRequest,
    CacheWarmupRequest, CacheWarmupResponse, Json,
};
use crate::domain::semantic_cache::{CacheLookup, SemanticCacheStats};

/// POST /v1/cache/query
///
/// Lookup only; a miss never triggers generation.
pub async fn query_cache(
    State(state): State<AppState>,
    Json(request): Json<CacheQueryRequest>,
) -> Result<Json<CacheLookup>, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::bad_request("query must not be empty").with_param("query"));
    }

    let lookup = state.cache.query(&request.query).await?;
    debug!(hit = lookup.hit, "Cache query served");

    Ok(Json(lookup))
}

/// GET /v1/cache/stats
pub async fn cache_stats(
    State(state): State<AppState>,
) -> Result<Json<SemanticCacheStats>, ApiError> {
    Ok(Json(state.cache.stats().await?))
}

/// POST /v1/cache/stats/reset
pub async fn reset_cache_stats(
    State(state): State<AppState>,
) -> Result<Json<SemanticCacheStats>, ApiError> {
    state.cache.reset_stats().await?;
    Ok(Json(state.cache.stats().await?))
}

/// POST /v1/cache/invalidate
pub async fn invalidate_cache(
    State(state): State<AppState>,
    Json(request): Json<CacheInvalidateRequest>,
) -> Result<Json<CacheInvalidateResponse>, ApiError> {
    let pattern = request.pattern.unwrap_or_default();
    let invalidated = state.cache.invalidate(&pattern).await?;

    info!(pattern = %pattern, invalidated, "Semantic cache invalidated");

    Ok(Json(CacheInvalidateResponse { invalidated }))
}

/// POST /v1/cache/warmup
pub async fn warmup_cache(
    State(state): State<AppState>,
    Json(request): Json<CacheWarmupRequest>,
) -> Result<Json<CacheWarmupResponse>, ApiError> {
    let pairs = request
        .entries
        .into_iter()
        .map(|entry| (entry.query, entry.response))
        .collect();

    let stored = state.cache.warmup(pairs).await?;

    Ok(Json(CacheWarmupResponse { stored }))
}
