//! Model catalog entries

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::IntentTag;

/// A routable model and what it costs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Catalog name, unique across the router
    pub name: String,
    /// Ordinal cost/capability rank, higher is more capable
    pub tier: u8,
    /// USD per prompt token
    #[serde(default)]
    pub cost_per_input_token: f64,
    /// USD per completion token
    #[serde(default)]
    pub cost_per_output_token: f64,
    #[serde(default)]
    pub capabilities: BTreeSet<IntentTag>,
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: u32,
    /// Name of the configured provider backend serving this model
    pub provider: String,
    /// Model identifier sent to the provider, defaults to `name`
    #[serde(default)]
    pub provider_model: Option<String>,
    #[serde(default = "default_healthy")]
    pub healthy: bool,
}

fn default_max_context_tokens() -> u32 {
    128_000
}

fn default_healthy() -> bool {
    true
}

impl ModelDescriptor {
    pub fn new(name: impl Into<String>, tier: u8, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tier,
            cost_per_input_token: 0.0,
            cost_per_output_token: 0.0,
            capabilities: BTreeSet::new(),
            max_context_tokens: default_max_context_tokens(),
            provider: provider.into(),
            provider_model: None,
            healthy: true,
        }
    }

    pub fn with_costs(mut self, per_input_token: f64, per_output_token: f64) -> Self {
        self.cost_per_input_token = per_input_token;
        self.cost_per_output_token = per_output_token;
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = IntentTag>) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    pub fn with_max_context_tokens(mut self, max_context_tokens: u32) -> Self {
        self.max_context_tokens = max_context_tokens;
        self
    }

    pub fn with_provider_model(mut self, provider_model: impl Into<String>) -> Self {
        self.provider_model = Some(provider_model.into());
        self
    }

    pub fn with_healthy(mut self, healthy: bool) -> Self {
        self.healthy = healthy;
        self
    }

    /// Identifier to send to the provider backend
    pub fn provider_model(&self) -> &str {
        self.provider_model.as_deref().unwrap_or(&self.name)
    }

    pub fn supports(&self, intent: IntentTag) -> bool {
        self.capabilities.contains(&intent)
    }

    pub fn cost_for(&self, prompt_tokens: u32, completion_tokens: u32) -> f64 {
        prompt_tokens as f64 * self.cost_per_input_token
            + completion_tokens as f64 * self.cost_per_output_token
    }

    /// Combined per-token price used to rank models by cost
    pub fn unit_cost(&self) -> f64 {
        self.cost_per_input_token + self.cost_per_output_token
    }

    pub fn is_billable(&self) -> bool {
        self.unit_cost() > 0.0
    }
}
