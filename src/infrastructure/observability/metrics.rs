//! Prometheus metrics infrastructure
//!
//! The recording helpers are safe to call before (or without) a recorder
//! being installed; the `metrics` facade then drops the samples.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use super::config::MetricsConfig;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    let builder = match PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("llm_request_duration_seconds".to_string()),
        &config.llm_duration_buckets,
    ) {
        Ok(builder) => builder,
        Err(e) => {
            tracing::warn!("Invalid LLM latency buckets, using summaries: {}", e);
            PrometheusBuilder::new()
        }
    };

    match builder.install_recorder() {
        Ok(handle) => {
            gauge!("verishield_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record the outcome of a semantic cache lookup
pub fn record_cache_lookup(hit: bool) {
    if hit {
        counter!("semantic_cache_hits_total").increment(1);
    } else {
        counter!("semantic_cache_misses_total").increment(1);
    }
}

pub fn record_cache_evictions(count: u64) {
    counter!("semantic_cache_evictions_total").increment(count);
}

pub fn set_cache_entries(count: usize) {
    gauge!("semantic_cache_entries").set(count as f64);
}

/// A cache operation failed and the request continued without it
pub fn record_cache_degraded(operation: &'static str) {
    counter!("semantic_cache_degraded_total", "operation" => operation).increment(1);
}

/// A caller joined an in-flight computation instead of starting its own
pub fn record_single_flight_coalesced() {
    counter!("single_flight_coalesced_total").increment(1);
}

/// Retrieval failed or timed out and the request continued with empty context
pub fn record_retrieval_degraded(reason: &'static str) {
    counter!("retrieval_degraded_total", "reason" => reason).increment(1);
}

pub fn record_router_fallback(model: &str, reason: &'static str) {
    counter!(
        "router_fallbacks_total",
        "model" => model.to_string(),
        "reason" => reason
    )
    .increment(1);
}

pub fn record_circuit_opened(model: &str) {
    counter!("circuit_breaker_open_total", "model" => model.to_string()).increment(1);
}

/// Spend recorded by the usage tracker, in micro-dollars
pub fn record_usage_cost(model: &str, cost_usd: f64) {
    let micros = (cost_usd.max(0.0) * 1_000_000.0).round() as u64;
    counter!("usage_cost_micros_total", "model" => model.to_string()).increment(micros);
}

/// Record a terminal pipeline outcome (`cache_hit`, `generated`, `exhausted`, ...)
pub fn record_pipeline_outcome(outcome: &'static str) {
    counter!("pipeline_requests_total", "outcome" => outcome).increment(1);
}

/// Record an HTTP request served by the API
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Record an LLM request metric
pub fn record_llm_request(params: LlmRequestMetricParams) {
    let labels = [
        ("provider", params.provider.to_string()),
        ("model", params.model.to_string()),
        ("status", if params.success { "success" } else { "error" }.to_string()),
    ];

    counter!("llm_requests_total", &labels).increment(1);
    histogram!("llm_request_duration_seconds", &labels).record(params.duration.as_secs_f64());

    if let Some(tokens) = params.input_tokens {
        counter!("llm_input_tokens_total", &labels).increment(tokens);
    }

    if let Some(tokens) = params.output_tokens {
        counter!("llm_output_tokens_total", &labels).increment(tokens);
    }
}

/// Parameters for LLM request metrics
pub struct LlmRequestMetricParams<'a> {
    pub provider: &'a str,
    pub model: &'a str,
    pub duration: Duration,
    pub success: bool,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_metrics_install_nothing() {
        let config = MetricsConfig::default().with_enabled(false);
        assert!(init_metrics(&config).is_none());
    }

    #[test]
    fn test_helpers_without_recorder_are_noops() {
        record_cache_lookup(true);
        record_cache_lookup(false);
        record_cache_evictions(2);
        set_cache_entries(10);
        record_router_fallback("gpt-4o", "provider_error");
        record_http_request("POST", "/v1/rag/generate", 200, Duration::from_millis(12));
        record_llm_request(LlmRequestMetricParams {
            provider: "openai",
            model: "gpt-4o",
            duration: Duration::from_millis(500),
            success: true,
            input_tokens: Some(100),
            output_tokens: Some(50),
        });
    }
}
