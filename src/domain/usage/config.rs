//! Usage tracker configuration

use serde::{Deserialize, Serialize};

use super::BudgetPeriod;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageConfig {
    #[serde(default)]
    pub daily_budget_usd: Option<f64>,
    #[serde(default)]
    pub weekly_budget_usd: Option<f64>,
    #[serde(default)]
    pub monthly_budget_usd: Option<f64>,
    /// Average cost ratio above which a cheaper model is suggested
    #[serde(default = "default_suggestion_cost_factor")]
    pub suggestion_cost_factor: f64,
    /// Minimum requests before a model is considered for suggestions
    #[serde(default = "default_suggestion_min_requests")]
    pub suggestion_min_requests: u64,
    /// Share of traffic assumed to move to the cheaper model
    #[serde(default = "default_suggestion_migration_fraction")]
    pub suggestion_migration_fraction: f64,
    #[serde(default = "default_alert_threshold_percents")]
    pub alert_threshold_percents: Vec<u8>,
}

fn default_suggestion_cost_factor() -> f64 {
    3.0
}

fn default_suggestion_min_requests() -> u64 {
    100
}

fn default_suggestion_migration_fraction() -> f64 {
    0.5
}

fn default_alert_threshold_percents() -> Vec<u8> {
    vec![50, 80, 100]
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            daily_budget_usd: None,
            weekly_budget_usd: None,
            monthly_budget_usd: None,
            suggestion_cost_factor: default_suggestion_cost_factor(),
            suggestion_min_requests: default_suggestion_min_requests(),
            suggestion_migration_fraction: default_suggestion_migration_fraction(),
            alert_threshold_percents: default_alert_threshold_percents(),
        }
    }
}

impl UsageConfig {
    pub fn with_budget(mut self, period: BudgetPeriod, limit_usd: f64) -> Self {
        match period {
            BudgetPeriod::Daily => self.daily_budget_usd = Some(limit_usd),
            BudgetPeriod::Weekly => self.weekly_budget_usd = Some(limit_usd),
            BudgetPeriod::Monthly => self.monthly_budget_usd = Some(limit_usd),
        }
        self
    }

    pub fn with_suggestion_rule(mut self, cost_factor: f64, min_requests: u64) -> Self {
        self.suggestion_cost_factor = cost_factor;
        self.suggestion_min_requests = min_requests;
        self
    }

    pub fn with_alert_thresholds(mut self, percents: Vec<u8>) -> Self {
        self.alert_threshold_percents = percents;
        self
    }

    pub fn budget_for(&self, period: BudgetPeriod) -> Option<f64> {
        match period {
            BudgetPeriod::Daily => self.daily_budget_usd,
            BudgetPeriod::Weekly => self.weekly_budget_usd,
            BudgetPeriod::Monthly => self.monthly_budget_usd,
        }
    }
}
