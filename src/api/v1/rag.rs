//! Retrieval and generation endpoint handlers

use axum::extract::State;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{
    ApiError, DeleteDocumentsRequest, DeleteDocumentsResponse, IngestDocumentRequest, Json,
    RagGenerateRequest, RagSearchRequest, RagSearchResponse,
};
use crate::domain::retrieval::IndexStats;
use crate::infrastructure::services::{IngestReport, RagAnswer};

/// POST /v1/rag/search
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<RagSearchRequest>,
) -> Result<Json<RagSearchResponse>, ApiError> {
    if request.top_k == Some(0) {
        return Err(ApiError::bad_request("top_k must be at least 1").with_param("top_k"));
    }

    let hits = state.retrieval.search(&request.query, request.top_k).await?;
    debug!(results = hits.len(), "RAG search served");

    let results = hits.into_iter().map(Into::into).collect();

    Ok(Json(RagSearchResponse { results }))
}

/// POST /v1/rag/generate
///
/// Dropping the request (client disconnect) cancels the in-flight pipeline.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<RagGenerateRequest>,
) -> Result<Json<RagAnswer>, ApiError> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let answer = state.pipeline.rag_generate(&request.query, &cancel).await?;

    debug!(
        cached = answer.cached,
        model = ?answer.model_used,
        "RAG answer served"
    );

    Ok(Json(answer))
}

/// POST /v1/rag/documents
pub async fn ingest_document(
    State(state): State<AppState>,
    Json(request): Json<IngestDocumentRequest>,
) -> Result<Json<IngestReport>, ApiError> {
    let report = state
        .retrieval
        .ingest(&request.source_id, &request.text, request.metadata)
        .await?;

    Ok(Json(report))
}

/// DELETE /v1/rag/documents
pub async fn delete_documents(
    State(state): State<AppState>,
    Json(request): Json<DeleteDocumentsRequest>,
) -> Result<Json<DeleteDocumentsResponse>, ApiError> {
    let deleted = state.retrieval.delete(&request.ids).await?;

    Ok(Json(DeleteDocumentsResponse { deleted }))
}

/// GET /v1/rag/stats
pub async fn index_stats(State(state): State<AppState>) -> Result<Json<IndexStats>, ApiError> {
    Ok(Json(state.retrieval.stats().await?))
}
