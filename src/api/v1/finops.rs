//! FinOps endpoint handlers

use axum::extract::{Query, State};

use crate::api::state::AppState;
use crate::api::types::{
    AlertsResponse, ApiError, ForecastQuery, Json, StatsQuery, SuggestionsResponse,
};
use crate::domain::usage::{CostForecast, FinOpsDashboard, UsageStats};

const DEFAULT_FORECAST_DAYS: u32 = 30;
const MAX_FORECAST_DAYS: u32 = 365;

/// GET /v1/finops/stats?period=
pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<UsageStats>, ApiError> {
    let window = query
        .window()
        .map_err(|e| ApiError::from(e).with_param("period"))?;

    Ok(Json(state.usage.stats_for_period(window).await?))
}

/// GET /v1/finops/dashboard
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<FinOpsDashboard>, ApiError> {
    Ok(Json(state.usage.dashboard().await?))
}

/// GET /v1/finops/suggestions
pub async fn suggestions(
    State(state): State<AppState>,
) -> Result<Json<SuggestionsResponse>, ApiError> {
    let suggestions = state.usage.suggest_optimizations().await?;
    Ok(Json(SuggestionsResponse { suggestions }))
}

/// GET /v1/finops/alerts
pub async fn alerts(State(state): State<AppState>) -> Result<Json<AlertsResponse>, ApiError> {
    let alerts = state.usage.cost_alerts().await?;
    Ok(Json(AlertsResponse { alerts }))
}

/// GET /v1/finops/forecast?days=
pub async fn forecast(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<CostForecast>, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_FORECAST_DAYS);

    if days == 0 || days > MAX_FORECAST_DAYS {
        return Err(ApiError::bad_request(format!(
            "days must be between 1 and {}",
            MAX_FORECAST_DAYS
        ))
        .with_param("days"));
    }

    Ok(Json(state.usage.forecast(days).await?))
}
