//! Models endpoint handlers

use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::infrastructure::routing::ModelStatus;

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub object: &'static str,
    pub data: Vec<ModelStatus>,
}

/// GET /v1/models
///
/// Router catalog with live circuit breaker health.
pub async fn list_models(State(state): State<AppState>) -> Result<Json<ModelsResponse>, ApiError> {
    Ok(Json(ModelsResponse {
        object: "list",
        data: state.router.models(),
    }))
}
