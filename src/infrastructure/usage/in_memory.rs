//! In-memory usage tracker

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::domain::routing::IntentTag;
use crate::domain::usage::{
    BudgetPeriod, BudgetState, CostAlert, CostForecast, FinOpsDashboard, ModelUsage,
    OptimizationSuggestion, StatsWindow, UsageConfig, UsageRecord, UsageStats, UsageTracker,
};
use crate::domain::DomainError;
use crate::infrastructure::observability::metrics;

/// Days of history behind the daily average used for forecasts
const FORECAST_HISTORY_DAYS: u32 = 7;
const DAYS_PER_MONTH: f64 = 30.0;

/// Append-only usage log held in memory
#[derive(Debug)]
pub struct InMemoryUsageTracker {
    config: UsageConfig,
    records: RwLock<Vec<UsageRecord>>,
    capabilities: HashMap<String, BTreeSet<IntentTag>>,
}

impl InMemoryUsageTracker {
    pub fn new(config: UsageConfig) -> Self {
        Self {
            config,
            records: RwLock::new(Vec::new()),
            capabilities: HashMap::new(),
        }
    }

    /// Declare which models can stand in for each other when suggesting
    /// cheaper alternatives. Models sharing a capability are comparable.
    pub fn with_capabilities(
        mut self,
        capabilities: impl IntoIterator<Item = (String, BTreeSet<IntentTag>)>,
    ) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    pub fn config(&self) -> &UsageConfig {
        &self.config
    }

    fn read_records(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<UsageRecord>>, DomainError> {
        self.records
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))
    }

    fn collect_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<UsageRecord>, DomainError> {
        let records = self.read_records()?;

        Ok(records
            .iter()
            .filter(|record| since.is_none_or(|since| record.timestamp >= since))
            .cloned()
            .collect())
    }

    pub fn stats_at(&self, window: StatsWindow, now: DateTime<Utc>) -> Result<UsageStats, DomainError> {
        let records = self.collect_since(window.since(now))?;
        Ok(UsageStats::from_records(window.as_str(), &records))
    }

    pub fn budget_state_at(
        &self,
        period: BudgetPeriod,
        now: DateTime<Utc>,
    ) -> Result<BudgetState, DomainError> {
        let start = period.start_at(now);
        let spent: f64 = self
            .read_records()?
            .iter()
            .filter(|record| record.timestamp >= start)
            .map(|record| record.cost)
            .sum();

        Ok(BudgetState::new(period, self.config.budget_for(period), spent))
    }

    pub fn cost_alerts_at(&self, now: DateTime<Utc>) -> Result<Vec<CostAlert>, DomainError> {
        let mut thresholds = self.config.alert_threshold_percents.clone();
        thresholds.sort_unstable();
        thresholds.dedup();

        let mut alerts = Vec::new();
        for period in BudgetPeriod::ALL {
            let state = self.budget_state_at(period, now)?;
            let (Some(limit), Some(used)) = (state.limit_usd, state.used_percent()) else {
                continue;
            };

            alerts.extend(
                thresholds
                    .iter()
                    .filter(|threshold| used >= f64::from(**threshold))
                    .map(|threshold| CostAlert::new(period, *threshold, state.spent_usd, limit)),
            );
        }

        Ok(alerts)
    }

    pub fn forecast_at(&self, days_ahead: u32, now: DateTime<Utc>) -> Result<CostForecast, DomainError> {
        let since = now - TimeDelta::days(i64::from(FORECAST_HISTORY_DAYS));
        let spent: f64 = self
            .read_records()?
            .iter()
            .filter(|record| record.timestamp >= since && record.timestamp <= now)
            .map(|record| record.cost)
            .sum();

        let daily_average_cost = spent / f64::from(FORECAST_HISTORY_DAYS);

        Ok(CostForecast {
            forecast_period_days: days_ahead,
            history_days: FORECAST_HISTORY_DAYS,
            daily_average_cost,
            projected_total_cost: daily_average_cost * f64::from(days_ahead),
        })
    }

    pub fn dashboard_at(&self, now: DateTime<Utc>) -> Result<FinOpsDashboard, DomainError> {
        let records = self.collect_since(Some(BudgetPeriod::Daily.start_at(now)))?;
        let today = UsageStats::from_records("today", &records);

        Ok(FinOpsDashboard {
            current_spend: today.total_cost,
            requests_today: today.total_requests,
            avg_cost_per_request: today.avg_cost_per_request,
            model_breakdown: today.per_model,
            timestamp: now,
        })
    }

    pub fn suggest_optimizations_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<OptimizationSuggestion>, DomainError> {
        let (usage, first_seen) = {
            let records = self.read_records()?;
            let mut usage: BTreeMap<String, ModelUsage> = BTreeMap::new();
            let mut first_seen: HashMap<String, DateTime<Utc>> = HashMap::new();

            for record in records.iter() {
                usage.entry(record.model_name.clone()).or_default().add(record);
                first_seen
                    .entry(record.model_name.clone())
                    .and_modify(|seen| *seen = (*seen).min(record.timestamp))
                    .or_insert(record.timestamp);
            }

            (usage, first_seen)
        };

        let mut suggestions = Vec::new();

        for (model, stats) in &usage {
            if stats.requests < self.config.suggestion_min_requests {
                continue;
            }

            let cheapest = usage
                .iter()
                .filter(|(other, _)| *other != model && self.comparable(model, other))
                .min_by(|(name_a, a), (name_b, b)| {
                    a.avg_cost_per_request
                        .total_cmp(&b.avg_cost_per_request)
                        .then_with(|| name_a.cmp(name_b))
                });

            let Some((cheaper_model, cheaper)) = cheapest else {
                continue;
            };

            if stats.avg_cost_per_request <= self.config.suggestion_cost_factor * cheaper.avg_cost_per_request {
                continue;
            }

            let observed_days = first_seen
                .get(model)
                .map(|seen| (now - *seen).num_seconds() as f64 / 86_400.0)
                .unwrap_or(0.0)
                .max(1.0);
            let monthly_volume = stats.requests as f64 / observed_days * DAYS_PER_MONTH;
            let estimated_savings =
                (stats.avg_cost_per_request - cheaper.avg_cost_per_request) * monthly_volume;

            suggestions.push(OptimizationSuggestion {
                model: model.clone(),
                cheaper_model: cheaper_model.clone(),
                suggestion: format!(
                    "Route {:.0}% of {} traffic to {}: average cost per request ${:.4} vs ${:.4}, \
                     up to ${:.2}/month if all of it moves",
                    self.config.suggestion_migration_fraction * 100.0,
                    model,
                    cheaper_model,
                    stats.avg_cost_per_request,
                    cheaper.avg_cost_per_request,
                    estimated_savings
                ),
                estimated_savings,
                avg_cost_per_request: stats.avg_cost_per_request,
                cheaper_avg_cost_per_request: cheaper.avg_cost_per_request,
                requests: stats.requests,
            });
        }

        suggestions.sort_by(|a, b| {
            b.estimated_savings
                .total_cmp(&a.estimated_savings)
                .then_with(|| a.model.cmp(&b.model))
        });

        Ok(suggestions)
    }

    /// Without declared capabilities every model is comparable
    fn comparable(&self, a: &str, b: &str) -> bool {
        if self.capabilities.is_empty() {
            return true;
        }

        match (self.capabilities.get(a), self.capabilities.get(b)) {
            (Some(caps_a), Some(caps_b)) => !caps_a.is_disjoint(caps_b),
            _ => false,
        }
    }
}

#[async_trait]
impl UsageTracker for InMemoryUsageTracker {
    async fn record(&self, record: UsageRecord) -> Result<(), DomainError> {
        metrics::record_usage_cost(&record.model_name, record.cost);
        debug!(
            model = %record.model_name,
            prompt_tokens = record.prompt_tokens,
            completion_tokens = record.completion_tokens,
            cost = record.cost,
            "Recorded usage"
        );

        self.records
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))?
            .push(record);

        Ok(())
    }

    async fn stats_for_period(&self, window: StatsWindow) -> Result<UsageStats, DomainError> {
        self.stats_at(window, Utc::now())
    }

    async fn budget_state(&self, period: BudgetPeriod) -> Result<BudgetState, DomainError> {
        self.budget_state_at(period, Utc::now())
    }

    async fn suggest_optimizations(&self) -> Result<Vec<OptimizationSuggestion>, DomainError> {
        self.suggest_optimizations_at(Utc::now())
    }

    async fn cost_alerts(&self) -> Result<Vec<CostAlert>, DomainError> {
        self.cost_alerts_at(Utc::now())
    }

    async fn forecast(&self, days_ahead: u32) -> Result<CostForecast, DomainError> {
        self.forecast_at(days_ahead, Utc::now())
    }

    async fn dashboard(&self) -> Result<FinOpsDashboard, DomainError> {
        self.dashboard_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 16, 12, 0, 0).unwrap()
    }

    fn record_at(model: &str, cost: f64, at: DateTime<Utc>) -> UsageRecord {
        UsageRecord::new(model, 100, 50, cost).with_timestamp(at)
    }

    async fn tracker_with(config: UsageConfig, records: Vec<UsageRecord>) -> InMemoryUsageTracker {
        let tracker = InMemoryUsageTracker::new(config);
        for record in records {
            tracker.record(record).await.unwrap();
        }
        tracker
    }

    #[tokio::test]
    async fn test_stats_respect_window() {
        let now = noon();
        let tracker = tracker_with(
            UsageConfig::default(),
            vec![
                record_at("a", 1.0, now - TimeDelta::minutes(10)),
                record_at("b", 2.0, now - TimeDelta::hours(5)),
                record_at("a", 4.0, now - TimeDelta::days(3)),
            ],
        )
        .await;

        let hour = tracker.stats_at(StatsWindow::LastHour, now).unwrap();
        assert_eq!(hour.total_requests, 1);
        assert_eq!(hour.total_cost, 1.0);

        let day = tracker.stats_at(StatsWindow::LastDay, now).unwrap();
        assert_eq!(day.total_requests, 2);
        assert_eq!(day.per_model.len(), 2);

        let all = tracker.stats_at(StatsWindow::All, now).unwrap();
        assert_eq!(all.total_cost, 7.0);
        assert_eq!(all.per_model["a"].requests, 2);
    }

    #[tokio::test]
    async fn test_budget_state_counts_current_period_only() {
        let now = noon();
        let config = UsageConfig::default()
            .with_budget(BudgetPeriod::Daily, 10.0)
            .with_budget(BudgetPeriod::Monthly, 100.0);
        let tracker = tracker_with(
            config,
            vec![
                record_at("a", 9.5, now - TimeDelta::hours(1)),
                record_at("a", 20.0, now - TimeDelta::days(2)),
            ],
        )
        .await;

        let daily = tracker.budget_state_at(BudgetPeriod::Daily, now).unwrap();
        assert!((daily.remaining_fraction - 0.05).abs() < 1e-9);
        assert!(daily.is_below(0.10));

        let monthly = tracker.budget_state_at(BudgetPeriod::Monthly, now).unwrap();
        assert!((monthly.spent_usd - 29.5).abs() < 1e-9);

        let weekly = tracker.budget_state_at(BudgetPeriod::Weekly, now).unwrap();
        assert_eq!(weekly.limit_usd, None);
    }

    #[tokio::test]
    async fn test_tightest_budget_picks_lowest_fraction() {
        let config = UsageConfig::default()
            .with_budget(BudgetPeriod::Daily, 1_000.0)
            .with_budget(BudgetPeriod::Monthly, 1.0);
        let tracker = tracker_with(config, vec![UsageRecord::new("a", 1, 1, 0.9)]).await;

        let tightest = tracker.tightest_budget().await.unwrap();
        assert_eq!(tightest.period, BudgetPeriod::Monthly);
    }

    #[tokio::test]
    async fn test_tightest_budget_unlimited() {
        let tracker = InMemoryUsageTracker::new(UsageConfig::default());

        let tightest = tracker.tightest_budget().await.unwrap();
        assert_eq!(tightest.remaining_fraction, 1.0);
        assert!(!tightest.is_exhausted());
    }

    #[tokio::test]
    async fn test_suggests_cheaper_capable_model() {
        let now = noon();
        let start = now - TimeDelta::days(10);
        let mut records = Vec::new();
        for i in 0..150 {
            records.push(record_at("premium", 0.10, start + TimeDelta::minutes(i)));
        }
        for i in 0..20 {
            records.push(record_at("budget", 0.01, start + TimeDelta::minutes(i)));
        }

        let tracker = tracker_with(UsageConfig::default(), records).await;
        let suggestions = tracker.suggest_optimizations_at(now).unwrap();

        assert_eq!(suggestions.len(), 1);
        let suggestion = &suggestions[0];
        assert_eq!(suggestion.model, "premium");
        assert_eq!(suggestion.cheaper_model, "budget");
        // 150 requests over 10 days, 30-day month
        let expected = (0.10 - 0.01) * (15.0 * 30.0);
        assert!((suggestion.estimated_savings - expected).abs() < 1e-6);
        assert!(suggestion.suggestion.starts_with("Route 50% of premium traffic to budget"));
        assert!(suggestion.suggestion.ends_with("up to $40.50/month if all of it moves"));
    }

    #[tokio::test]
    async fn test_no_suggestion_below_volume_or_factor() {
        let now = noon();
        let mut records = Vec::new();
        for _ in 0..50 {
            records.push(record_at("premium", 0.10, now - TimeDelta::hours(1)));
        }
        for _ in 0..200 {
            records.push(record_at("mid", 0.05, now - TimeDelta::hours(1)));
        }
        records.push(record_at("cheap", 0.02, now - TimeDelta::hours(1)));

        let tracker = tracker_with(UsageConfig::default(), records).await;

        // premium under min volume, mid only 2.5x the cheapest
        assert!(tracker.suggest_optimizations_at(now).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_suggestions_only_between_capable_models() {
        let now = noon();
        let mut records = Vec::new();
        for _ in 0..120 {
            records.push(record_at("vision-pro", 0.20, now - TimeDelta::hours(2)));
        }
        records.push(record_at("text-mini", 0.001, now - TimeDelta::hours(2)));

        let tracker = tracker_with(UsageConfig::default(), records)
            .await
            .with_capabilities([
                ("vision-pro".to_string(), BTreeSet::from([IntentTag::Vision])),
                ("text-mini".to_string(), BTreeSet::from([IntentTag::FastQa])),
            ]);

        assert!(tracker.suggest_optimizations_at(now).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cost_alerts_for_crossed_thresholds() {
        let now = noon();
        let config = UsageConfig::default().with_budget(BudgetPeriod::Daily, 10.0);
        let tracker = tracker_with(config, vec![record_at("a", 8.5, now - TimeDelta::hours(1))]).await;

        let alerts = tracker.cost_alerts_at(now).unwrap();
        let crossed: Vec<u8> = alerts.iter().map(|alert| alert.threshold_percent).collect();

        assert_eq!(crossed, vec![50, 80]);
        assert!(alerts.iter().all(|alert| alert.period == BudgetPeriod::Daily));
    }

    #[tokio::test]
    async fn test_forecast_uses_trailing_week() {
        let now = noon();
        let tracker = tracker_with(
            UsageConfig::default(),
            vec![
                record_at("a", 7.0, now - TimeDelta::days(1)),
                record_at("a", 7.0, now - TimeDelta::days(6)),
                record_at("a", 100.0, now - TimeDelta::days(20)),
            ],
        )
        .await;

        let forecast = tracker.forecast_at(30, now).unwrap();
        assert!((forecast.daily_average_cost - 2.0).abs() < 1e-9);
        assert!((forecast.projected_total_cost - 60.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_dashboard_shows_today() {
        let now = noon();
        let tracker = tracker_with(
            UsageConfig::default(),
            vec![
                record_at("a", 1.0, now - TimeDelta::hours(1)),
                record_at("b", 3.0, now - TimeDelta::hours(2)),
                record_at("a", 50.0, now - TimeDelta::days(1)),
            ],
        )
        .await;

        let dashboard = tracker.dashboard_at(now).unwrap();
        assert_eq!(dashboard.requests_today, 2);
        assert_eq!(dashboard.current_spend, 4.0);
        assert_eq!(dashboard.avg_cost_per_request, 2.0);
        assert_eq!(dashboard.model_breakdown.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_appends() {
        let tracker = Arc::new(InMemoryUsageTracker::new(UsageConfig::default()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let tracker = tracker.clone();
                tokio::spawn(async move {
                    for _ in 0..25 {
                        tracker.record(UsageRecord::new("a", 1, 1, 0.01)).await.unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        let stats = tracker.stats_for_period(StatsWindow::All).await.unwrap();
        assert_eq!(stats.total_requests, 400);
    }
}
