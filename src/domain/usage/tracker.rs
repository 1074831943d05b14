//! Usage tracker trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::{
    BudgetPeriod, BudgetState, CostAlert, CostForecast, FinOpsDashboard, OptimizationSuggestion,
    StatsWindow, UsageRecord, UsageStats,
};
use crate::domain::DomainError;

/// Append-only usage log with cost views over it
#[async_trait]
pub trait UsageTracker: Send + Sync + Debug {
    async fn record(&self, record: UsageRecord) -> Result<(), DomainError>;

    async fn stats_for_period(&self, window: StatsWindow) -> Result<UsageStats, DomainError>;

    async fn budget_state(&self, period: BudgetPeriod) -> Result<BudgetState, DomainError>;

    /// Budget state with the smallest remaining fraction across periods
    async fn tightest_budget(&self) -> Result<BudgetState, DomainError> {
        let mut tightest: Option<BudgetState> = None;

        for period in BudgetPeriod::ALL {
            let state = self.budget_state(period).await?;
            if tightest
                .as_ref()
                .is_none_or(|current| state.remaining_fraction < current.remaining_fraction)
            {
                tightest = Some(state);
            }
        }

        tightest.ok_or_else(|| DomainError::internal("no budget periods"))
    }

    async fn suggest_optimizations(&self) -> Result<Vec<OptimizationSuggestion>, DomainError>;

    async fn cost_alerts(&self) -> Result<Vec<CostAlert>, DomainError>;

    async fn forecast(&self, days_ahead: u32) -> Result<CostForecast, DomainError>;

    async fn dashboard(&self) -> Result<FinOpsDashboard, DomainError>;
}
