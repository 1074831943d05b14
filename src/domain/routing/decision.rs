//! Routing decisions

use serde::{Deserialize, Serialize};

use super::{IntentTag, ModelDescriptor};

/// Why the chosen model was picked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingReason {
    /// First candidate for the classified intent
    ClassifiedTier,
    /// Remaining budget below the floor forced the cheapest capable model
    BudgetDowngrade,
    /// The preferred model was unhealthy and was skipped
    HealthFailover,
}

impl RoutingReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClassifiedTier => "classified-tier",
            Self::BudgetDowngrade => "budget-downgrade",
            Self::HealthFailover => "health-failover",
        }
    }
}

impl std::fmt::Display for RoutingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chosen model plus the ordered models to try after it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub intent: IntentTag,
    pub chosen_model: ModelDescriptor,
    pub fallback_chain: Vec<ModelDescriptor>,
    pub reason: RoutingReason,
}

impl RoutingDecision {
    /// Chosen model followed by the fallback chain
    pub fn attempt_order(&self) -> impl Iterator<Item = &ModelDescriptor> {
        std::iter::once(&self.chosen_model).chain(self.fallback_chain.iter())
    }

    pub fn candidate_names(&self) -> Vec<String> {
        self.attempt_order().map(|model| model.name.clone()).collect()
    }
}
