//! FinOps views derived from the usage log

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ModelUsage;

/// Suggest moving traffic from an expensive model to a cheaper one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSuggestion {
    pub model: String,
    pub cheaper_model: String,
    pub suggestion: String,
    /// Projected monthly saving in USD
    pub estimated_savings: f64,
    pub avg_cost_per_request: f64,
    pub cheaper_avg_cost_per_request: f64,
    pub requests: u64,
}

/// Spend projection from the trailing daily average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostForecast {
    pub forecast_period_days: u32,
    pub history_days: u32,
    pub daily_average_cost: f64,
    pub projected_total_cost: f64,
}

/// Today's spend at a glance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinOpsDashboard {
    pub current_spend: f64,
    pub requests_today: u64,
    pub avg_cost_per_request: f64,
    pub model_breakdown: BTreeMap<String, ModelUsage>,
    pub timestamp: DateTime<Utc>,
}
