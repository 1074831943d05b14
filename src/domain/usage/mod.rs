//! Usage tracking and cost management domain
//!
//! Records token and cost usage per model call and derives statistics,
//! budget state and optimization hints from the append-only log.

mod budget;
mod config;
mod insights;
mod record;
mod tracker;

pub use budget::{BudgetPeriod, BudgetState, CostAlert};
pub use config::UsageConfig;
pub use insights::{CostForecast, FinOpsDashboard, OptimizationSuggestion};
pub use record::{ModelUsage, StatsWindow, UsageRecord, UsageStats};
pub use tracker::UsageTracker;
