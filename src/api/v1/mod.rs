//! v1 API endpoints

pub mod cache;
pub mod finops;
pub mod models;
pub mod rag;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/cache/query", post(cache::query_cache))
        .route("/cache/stats", get(cache::cache_stats))
        .route("/cache/stats/reset", post(cache::reset_cache_stats))
        .route("/cache/invalidate", post(cache::invalidate_cache))
        .route("/cache/warmup", post(cache::warmup_cache))
        .route("/rag/search", post(rag::search))
        .route("/rag/generate", post(rag::generate))
        .route(
            "/rag/documents",
            post(rag::ingest_document).delete(rag::delete_documents),
        )
        .route("/rag/stats", get(rag::index_stats))
        .route("/finops/stats", get(finops::stats))
        .route("/finops/dashboard", get(finops::dashboard))
        .route("/finops/suggestions", get(finops::suggestions))
        .route("/finops/alerts", get(finops::alerts))
        .route("/finops/forecast", get(finops::forecast))
        .route("/models", get(models::list_models))
}
