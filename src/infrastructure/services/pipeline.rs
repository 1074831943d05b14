//! Request pipeline: cache check, retrieval and classification fan-out,
//! routing, invocation and cache population.
//!
//! Cache and index failures degrade to a miss or an empty context. Only
//! provider exhaustion, a hard budget stop and cancellation reach the caller.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{CacheSource, RetrievalService, SemanticCacheService};
use crate::domain::llm::{LlmProvider, LlmRequest};
use crate::domain::retrieval::SearchHit;
use crate::domain::routing::{IntentTag, RoutingReason};
use crate::domain::usage::{BudgetPeriod, BudgetState, UsageTracker};
use crate::domain::DomainError;
use crate::infrastructure::llm::LlmBackend;
use crate::infrastructure::observability::metrics;
use crate::infrastructure::routing::ModelRouter;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Whole-request deadline
    #[serde(default = "default_request_deadline_ms")]
    pub request_deadline_ms: u64,
    /// How long generation waits for retrieval before proceeding without context
    #[serde(default = "default_fanout_timeout_ms")]
    pub fanout_timeout_ms: u64,
    #[serde(default = "default_context_top_k")]
    pub context_top_k: usize,
}

fn default_request_deadline_ms() -> u64 {
    60_000
}

fn default_fanout_timeout_ms() -> u64 {
    2_000
}

fn default_context_top_k() -> usize {
    3
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_deadline_ms: default_request_deadline_ms(),
            fanout_timeout_ms: default_fanout_timeout_ms(),
            context_top_k: default_context_top_k(),
        }
    }
}

impl PipelineConfig {
    pub fn request_deadline(&self) -> Duration {
        Duration::from_millis(self.request_deadline_ms)
    }

    pub fn fanout_timeout(&self) -> Duration {
        Duration::from_millis(self.fanout_timeout_ms)
    }

    pub fn with_request_deadline(mut self, deadline: Duration) -> Self {
        self.request_deadline_ms = deadline.as_millis() as u64;
        self
    }

    pub fn with_fanout_timeout(mut self, timeout: Duration) -> Self {
        self.fanout_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_context_top_k(mut self, top_k: usize) -> Self {
        self.context_top_k = top_k;
        self
    }
}

/// Generated (or cached) answer to a RAG request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    pub response: String,
    /// Ids of the retrieved chunks placed in the prompt
    #[serde(default)]
    pub context_used: Vec<String>,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<IntentTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_reason: Option<RoutingReason>,
    /// Models skipped before one answered
    #[serde(default)]
    pub fallbacks: usize,
    /// Spend incurred by this request
    #[serde(default)]
    pub cost_usd: f64,
}

impl RagAnswer {
    /// Decode a cached payload; payloads stored by warmup may be plain values
    fn from_payload(payload: serde_json::Value) -> Self {
        match serde_json::from_value::<RagAnswer>(payload.clone()) {
            Ok(answer) => answer,
            Err(_) => Self {
                response: match payload {
                    serde_json::Value::String(text) => text,
                    other => other.to_string(),
                },
                context_used: Vec::new(),
                model_used: None,
                cached: false,
                intent: None,
                routing_reason: None,
                fallbacks: 0,
                cost_usd: 0.0,
            },
        }
    }
}

#[derive(Debug)]
pub struct PipelineCoordinator<P: LlmProvider = LlmBackend> {
    cache: Arc<SemanticCacheService>,
    retrieval: Arc<RetrievalService>,
    router: Arc<ModelRouter<P>>,
    usage: Arc<dyn UsageTracker>,
    config: PipelineConfig,
}

impl<P: LlmProvider> PipelineCoordinator<P> {
    pub fn new(
        cache: Arc<SemanticCacheService>,
        retrieval: Arc<RetrievalService>,
        router: Arc<ModelRouter<P>>,
        usage: Arc<dyn UsageTracker>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            cache,
            retrieval,
            router,
            usage,
            config,
        }
    }

    /// Answer `text` with retrieved context, serving equivalent queries from
    /// the semantic cache
    pub async fn rag_generate(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<RagAnswer, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::validation("Query text must not be empty"));
        }

        let outcome = match tokio::time::timeout(self.config.request_deadline(), self.execute(text, cancel)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(DomainError::cancelled(format!(
                "request deadline of {}ms exceeded",
                self.config.request_deadline_ms
            ))),
        };

        metrics::record_pipeline_outcome(match &outcome {
            Ok(answer) if answer.cached => "cache_hit",
            Ok(_) => "generated",
            Err(DomainError::AllProvidersExhausted { .. }) => "exhausted",
            Err(DomainError::BudgetExceeded { .. }) => "budget_exceeded",
            Err(DomainError::Cancelled { .. }) => "cancelled",
            Err(_) => "error",
        });

        outcome
    }

    async fn execute(&self, text: &str, cancel: &CancellationToken) -> Result<RagAnswer, DomainError> {
        let embedding = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(DomainError::cancelled("request cancelled while embedding the query"));
            }
            result = self.cache.embed(text) => match result {
                Ok(embedding) => Some(embedding),
                Err(e) => {
                    metrics::record_cache_degraded("embed");
                    warn!("Failed to embed query, continuing without cache and context: {}", e);
                    None
                }
            },
        };

        let Some(embedding) = embedding else {
            return self.generate(text, None, cancel).await;
        };

        let (payload, source) = self
            .cache
            .get_or_compute(embedding.clone(), text, cancel, || async {
                let answer = self.generate(text, Some(&embedding), cancel).await?;
                serde_json::to_value(&answer).map_err(|e| {
                    DomainError::internal(format!("Failed to serialize answer for cache: {}", e))
                })
            })
            .await?;

        let mut answer = RagAnswer::from_payload(payload);
        match source {
            CacheSource::Hit => {
                answer.cached = true;
                answer.cost_usd = 0.0;
            }
            CacheSource::Coalesced => answer.cost_usd = 0.0,
            CacheSource::Computed => {}
        }

        Ok(answer)
    }

    async fn generate(
        &self,
        text: &str,
        embedding: Option<&[f32]>,
        cancel: &CancellationToken,
    ) -> Result<RagAnswer, DomainError> {
        let fan_out = async {
            tokio::join!(self.retrieve_context(text, embedding), self.router.classify(text))
        };

        let (hits, intent) = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(DomainError::cancelled("request cancelled during retrieval"));
            }
            results = fan_out => results,
        };

        let intent = intent.unwrap_or_else(|e| {
            warn!("Intent classification failed, defaulting to fast-qa: {}", e);
            IntentTag::FastQa
        });

        let budget = match self.usage.tightest_budget().await {
            Ok(budget) => budget,
            Err(e) => {
                warn!("Budget unavailable, routing without budget pressure: {}", e);
                BudgetState::unlimited(BudgetPeriod::Daily, 0.0)
            }
        };

        let decision = self.router.select(intent, &budget)?;

        let context_used: Vec<String> = hits.iter().map(|hit| hit.document.id.clone()).collect();
        let context: Vec<String> = hits.into_iter().map(|hit| hit.document.chunk_text).collect();
        let request = LlmRequest::with_context(text, &context);

        let routed = self.router.invoke(&decision, request, cancel).await?;

        debug!(
            model = %routed.model,
            intent = %intent,
            context = context_used.len(),
            fallbacks = routed.fallbacks,
            "Generated answer"
        );

        Ok(RagAnswer {
            response: routed.response.content,
            context_used,
            model_used: Some(routed.model),
            cached: false,
            intent: Some(intent),
            routing_reason: Some(decision.reason),
            fallbacks: routed.fallbacks,
            cost_usd: routed.usage.cost,
        })
    }

    /// Retrieval context bounded by the fan-out timeout; empty on any failure
    async fn retrieve_context(&self, text: &str, embedding: Option<&[f32]>) -> Vec<SearchHit> {
        let Some(embedding) = embedding else {
            metrics::record_retrieval_degraded("no_embedding");
            return Vec::new();
        };

        let search = self
            .retrieval
            .search_with_embedding(embedding, text, Some(self.config.context_top_k));

        match tokio::time::timeout(self.config.fanout_timeout(), search).await {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                metrics::record_retrieval_degraded("error");
                warn!("Retrieval failed, continuing without context: {}", e);
                Vec::new()
            }
            Err(_) => {
                metrics::record_retrieval_degraded("timeout");
                warn!(
                    timeout_ms = self.config.fanout_timeout_ms,
                    "Retrieval timed out, continuing without context"
                );
                Vec::new()
            }
        }
    }
}
