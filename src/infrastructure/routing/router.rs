//! Model router: classify, select and invoke with fallback

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::circuit_breaker::{CircuitBreaker, CircuitState, FailureOutcome};
use super::RouterConfig;
use crate::domain::llm::{LlmProvider, LlmRequest, LlmResponse};
use crate::domain::routing::{
    select_models, IntentClassifier, IntentTag, ModelDescriptor, RoutingDecision,
    RuleBasedClassifier,
};
use crate::domain::usage::{BudgetState, UsageRecord, UsageTracker};
use crate::domain::DomainError;
use crate::infrastructure::llm::{LlmBackend, LlmProviderFactory};
use crate::infrastructure::observability::metrics::{self, LlmRequestMetricParams};

/// Catalog entry with live circuit state
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    #[serde(flatten)]
    pub model: ModelDescriptor,
    pub circuit_state: CircuitState,
}

/// Successful invocation and what it cost
#[derive(Debug, Clone)]
pub struct RoutedResponse {
    pub response: LlmResponse,
    /// Catalog name of the model that answered
    pub model: String,
    pub provider: &'static str,
    /// Models tried and skipped before this one
    pub fallbacks: usize,
    pub usage: UsageRecord,
}

#[derive(Debug)]
pub struct ModelRouter<P: LlmProvider = LlmBackend> {
    models: Vec<ModelDescriptor>,
    providers: HashMap<String, Arc<P>>,
    breakers: HashMap<String, CircuitBreaker>,
    classifier: Arc<dyn IntentClassifier>,
    usage: Option<Arc<dyn UsageTracker>>,
    invoke_timeout: Duration,
    budget_floor_fraction: f64,
}

impl ModelRouter<LlmBackend> {
    /// Build the router and its provider backends from configuration
    pub fn from_config(config: &RouterConfig) -> Result<Self, DomainError> {
        let mut providers = HashMap::new();

        for provider in &config.providers {
            let backend = LlmProviderFactory::create(provider, config.invoke_timeout())?;
            if providers.insert(provider.name.clone(), Arc::new(backend)).is_some() {
                return Err(DomainError::configuration(format!(
                    "Duplicate provider name '{}'",
                    provider.name
                )));
            }
        }

        Self::new(config, providers)
    }
}

impl<P: LlmProvider> ModelRouter<P> {
    pub fn new(config: &RouterConfig, providers: HashMap<String, Arc<P>>) -> Result<Self, DomainError> {
        if config.models.is_empty() {
            return Err(DomainError::configuration("Router needs at least one model"));
        }

        let mut names = HashSet::new();
        for model in &config.models {
            if !names.insert(model.name.as_str()) {
                return Err(DomainError::configuration(format!(
                    "Duplicate model name '{}'",
                    model.name
                )));
            }

            if !providers.contains_key(&model.provider) {
                return Err(DomainError::configuration(format!(
                    "Model '{}' references unknown provider '{}'",
                    model.name, model.provider
                )));
            }
        }

        let breakers = config
            .models
            .iter()
            .map(|model| {
                (
                    model.name.clone(),
                    CircuitBreaker::new(config.failure_threshold, config.cooldown()),
                )
            })
            .collect();

        Ok(Self {
            models: config.models.clone(),
            providers,
            breakers,
            classifier: Arc::new(RuleBasedClassifier::new()),
            usage: None,
            invoke_timeout: config.invoke_timeout(),
            budget_floor_fraction: config.budget_floor_fraction,
        })
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Report every successful invocation to `usage`
    pub fn with_usage_tracker(mut self, usage: Arc<dyn UsageTracker>) -> Self {
        self.usage = Some(usage);
        self
    }

    pub async fn classify(&self, text: &str) -> Result<IntentTag, DomainError> {
        self.classifier.classify(text).await
    }

    /// Catalog with `healthy` reflecting configuration and circuit state
    pub fn catalog(&self) -> Vec<ModelDescriptor> {
        self.models
            .iter()
            .map(|model| {
                let available = self
                    .breakers
                    .get(&model.name)
                    .is_some_and(CircuitBreaker::is_available);
                model.clone().with_healthy(model.healthy && available)
            })
            .collect()
    }

    pub fn models(&self) -> Vec<ModelStatus> {
        self.catalog()
            .into_iter()
            .map(|model| {
                let circuit_state = self
                    .breakers
                    .get(&model.name)
                    .map(CircuitBreaker::state)
                    .unwrap_or(CircuitState::Closed);
                ModelStatus {
                    model,
                    circuit_state,
                }
            })
            .collect()
    }

    pub fn select(&self, intent: IntentTag, budget: &BudgetState) -> Result<RoutingDecision, DomainError> {
        let decision = select_models(&self.catalog(), intent, budget, self.budget_floor_fraction)?;

        debug!(
            intent = %intent,
            model = %decision.chosen_model.name,
            fallbacks = decision.fallback_chain.len(),
            reason = %decision.reason,
            "Routing decision"
        );

        Ok(decision)
    }

    /// Try the chosen model, then each fallback, until one succeeds
    ///
    /// Provider errors and timeouts count against the model's circuit.
    /// Models whose context window cannot hold the prompt are skipped
    /// without counting a failure. Cancellation stops immediately.
    pub async fn invoke(
        &self,
        decision: &RoutingDecision,
        request: LlmRequest,
        cancel: &CancellationToken,
    ) -> Result<RoutedResponse, DomainError> {
        let estimated_tokens = request.estimated_prompt_tokens();
        let mut attempted = Vec::new();

        for (position, model) in decision.attempt_order().enumerate() {
            if cancel.is_cancelled() {
                return Err(DomainError::cancelled("request cancelled before model invocation"));
            }

            attempted.push(model.name.clone());

            if estimated_tokens > model.max_context_tokens {
                warn!(
                    model = %model.name,
                    estimated_tokens,
                    max_context_tokens = model.max_context_tokens,
                    "Prompt exceeds context window, skipping model"
                );
                metrics::record_router_fallback(&model.name, "context_window");
                continue;
            }

            let (Some(provider), Some(breaker)) = (
                self.providers.get(&model.provider),
                self.breakers.get(&model.name),
            ) else {
                warn!(model = %model.name, "Model not served by this router, skipping");
                metrics::record_router_fallback(&model.name, "unknown_model");
                continue;
            };

            let Some(permit) = breaker.try_acquire() else {
                debug!(model = %model.name, "Circuit open, skipping model");
                metrics::record_router_fallback(&model.name, "circuit_open");
                continue;
            };

            let started = Instant::now();
            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(DomainError::cancelled("request cancelled during model invocation"));
                }
                result = tokio::time::timeout(
                    self.invoke_timeout,
                    provider.generate(model.provider_model(), request.clone()),
                ) => match result {
                    Ok(result) => result,
                    Err(_) => Err(DomainError::provider_timeout(
                        provider.provider_name(),
                        self.invoke_timeout.as_millis() as u64,
                    )),
                },
            };

            match outcome {
                Ok(response) => {
                    if permit.succeed() {
                        info!(model = %model.name, "Circuit closed");
                    }

                    let usage = response.usage;
                    metrics::record_llm_request(LlmRequestMetricParams {
                        provider: provider.provider_name(),
                        model: &model.name,
                        duration: started.elapsed(),
                        success: true,
                        input_tokens: Some(u64::from(usage.prompt_tokens)),
                        output_tokens: Some(u64::from(usage.completion_tokens)),
                    });

                    let record = UsageRecord::new(
                        &model.name,
                        usage.prompt_tokens,
                        usage.completion_tokens,
                        model.cost_for(usage.prompt_tokens, usage.completion_tokens),
                    );

                    if let Some(tracker) = &self.usage {
                        if let Err(e) = tracker.record(record.clone()).await {
                            warn!(model = %model.name, error = %e, "Failed to record usage");
                        }
                    }

                    return Ok(RoutedResponse {
                        response,
                        model: model.name.clone(),
                        provider: provider.provider_name(),
                        fallbacks: position,
                        usage: record,
                    });
                }
                Err(e @ DomainError::Cancelled { .. }) => return Err(e),
                Err(e) => {
                    metrics::record_llm_request(LlmRequestMetricParams {
                        provider: provider.provider_name(),
                        model: &model.name,
                        duration: started.elapsed(),
                        success: false,
                        input_tokens: None,
                        output_tokens: None,
                    });

                    if e.is_provider_failure() {
                        match permit.fail() {
                            FailureOutcome::Opened | FailureOutcome::Reopened => {
                                warn!(model = %model.name, "Circuit opened");
                                metrics::record_circuit_opened(&model.name);
                            }
                            FailureOutcome::StillClosed => {}
                        }
                    } else {
                        drop(permit);
                    }

                    let reason = match e {
                        DomainError::ProviderTimeout { .. } => "timeout",
                        _ => "provider_error",
                    };
                    warn!(model = %model.name, error = %e, "Model invocation failed, falling back");
                    metrics::record_router_fallback(&model.name, reason);
                }
            }
        }

        Err(DomainError::all_providers_exhausted(attempted))
    }
}
