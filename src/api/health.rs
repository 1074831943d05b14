//! Health check endpoints for Kubernetes probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use super::state::AppState;
use crate::api::types::Json;

/// Detailed health response with component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize, Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus, message: Option<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message,
            latency_ms: Some(start.elapsed().as_millis() as u64),
        }
    }
}

/// Returns 200 while the process is up
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check over the cache, the index and the model catalog.
///
/// A degraded cache or index still serves requests; no healthy model does not.
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let checks = vec![
        check_cache(&state).await,
        check_index(&state).await,
        check_models(&state),
    ];

    let overall_status = overall(&checks);
    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Liveness probe
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

fn overall(checks: &[HealthCheck]) -> HealthStatus {
    let model_down = checks
        .iter()
        .any(|check| check.name == "models" && check.status == HealthStatus::Unhealthy);

    if model_down {
        HealthStatus::Unhealthy
    } else if checks.iter().all(|check| check.status == HealthStatus::Healthy) {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    }
}

async fn check_cache(state: &AppState) -> HealthCheck {
    let start = Instant::now();

    if !state.cache.is_enabled() {
        return HealthCheck::new(
            "semantic_cache",
            HealthStatus::Degraded,
            Some("disabled".to_string()),
            start,
        );
    }

    match state.cache.stats().await {
        Ok(_) => HealthCheck::new("semantic_cache", HealthStatus::Healthy, None, start),
        Err(e) => HealthCheck::new(
            "semantic_cache",
            HealthStatus::Degraded,
            Some(e.to_string()),
            start,
        ),
    }
}

async fn check_index(state: &AppState) -> HealthCheck {
    let start = Instant::now();

    match state.retrieval.stats().await {
        Ok(_) => HealthCheck::new("retrieval_index", HealthStatus::Healthy, None, start),
        Err(e) => HealthCheck::new(
            "retrieval_index",
            HealthStatus::Degraded,
            Some(e.to_string()),
            start,
        ),
    }
}

fn check_models(state: &AppState) -> HealthCheck {
    let start = Instant::now();
    let catalog = state.router.catalog();
    let healthy = catalog.iter().filter(|model| model.healthy).count();

    let status = match healthy {
        0 => HealthStatus::Unhealthy,
        n if n < catalog.len() => HealthStatus::Degraded,
        _ => HealthStatus::Healthy,
    };

    HealthCheck::new(
        "models",
        status,
        Some(format!("{}/{} healthy", healthy, catalog.len())),
        start,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(name: &str, status: HealthStatus) -> HealthCheck {
        HealthCheck {
            name: name.to_string(),
            status,
            message: None,
            latency_ms: None,
        }
    }

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
    }

    #[test]
    fn test_health_response_omits_empty_checks() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "1.0.0".to_string(),
            checks: None,
            latency_ms: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(!json.contains("checks"));
    }

    #[test]
    fn test_degraded_cache_keeps_service_ready() {
        let checks = vec![
            check("semantic_cache", HealthStatus::Degraded),
            check("retrieval_index", HealthStatus::Healthy),
            check("models", HealthStatus::Healthy),
        ];
        assert_eq!(overall(&checks), HealthStatus::Degraded);
    }

    #[test]
    fn test_no_healthy_model_is_unhealthy() {
        let checks = vec![
            check("semantic_cache", HealthStatus::Healthy),
            check("models", HealthStatus::Unhealthy),
        ];
        assert_eq!(overall(&checks), HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_ready_check_with_default_state() {
        let state = crate::create_app_state().unwrap();

        let response = ready_check(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
