//! Router configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::routing::{IntentTag, ModelDescriptor, DEFAULT_BUDGET_FLOOR_FRACTION};
use crate::infrastructure::llm::{LlmProviderConfig, LlmProviderKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Upper bound for a single model call
    #[serde(default = "default_invoke_timeout_ms")]
    pub invoke_timeout_ms: u64,
    /// Consecutive failures before a model's circuit opens
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Time an open circuit waits before letting a probe through
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default = "default_budget_floor_fraction")]
    pub budget_floor_fraction: f64,
    #[serde(default = "default_models")]
    pub models: Vec<ModelDescriptor>,
    #[serde(default = "default_providers")]
    pub providers: Vec<LlmProviderConfig>,
}

fn default_invoke_timeout_ms() -> u64 {
    30_000
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_cooldown_ms() -> u64 {
    30_000
}

fn default_budget_floor_fraction() -> f64 {
    DEFAULT_BUDGET_FLOOR_FRACTION
}

/// Offline catalog so a bare checkout serves requests
fn default_models() -> Vec<ModelDescriptor> {
    vec![ModelDescriptor::new("echo", 1, "local").with_capabilities(IntentTag::ALL)]
}

fn default_providers() -> Vec<LlmProviderConfig> {
    vec![LlmProviderConfig::new("local", LlmProviderKind::Echo)]
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            invoke_timeout_ms: default_invoke_timeout_ms(),
            failure_threshold: default_failure_threshold(),
            cooldown_ms: default_cooldown_ms(),
            budget_floor_fraction: default_budget_floor_fraction(),
            models: default_models(),
            providers: default_providers(),
        }
    }
}

impl RouterConfig {
    pub fn invoke_timeout(&self) -> Duration {
        Duration::from_millis(self.invoke_timeout_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn with_models(mut self, models: Vec<ModelDescriptor>) -> Self {
        self.models = models;
        self
    }

    pub fn with_providers(mut self, providers: Vec<LlmProviderConfig>) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_invoke_timeout(mut self, timeout: Duration) -> Self {
        self.invoke_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_circuit_breaker(mut self, failure_threshold: u32, cooldown: Duration) -> Self {
        self.failure_threshold = failure_threshold;
        self.cooldown_ms = cooldown.as_millis() as u64;
        self
    }

    pub fn with_budget_floor_fraction(mut self, fraction: f64) -> Self {
        self.budget_floor_fraction = fraction.clamp(0.0, 1.0);
        self
    }
}
