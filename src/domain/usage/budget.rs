//! Budget periods and their state

use chrono::{DateTime, Datelike, Days, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Budget period with calendar-aligned resets (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    /// Resets at midnight UTC
    Daily,
    /// Resets on Monday midnight UTC
    Weekly,
    /// Resets on the 1st of the month midnight UTC
    Monthly,
}

impl BudgetPeriod {
    pub const ALL: [BudgetPeriod; 3] = [Self::Daily, Self::Weekly, Self::Monthly];

    /// Start of the period containing `now`
    pub fn start_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive();

        let start = match self {
            Self::Daily => today,
            Self::Weekly => today
                .checked_sub_days(Days::new(today.weekday().num_days_from_monday() as u64))
                .unwrap_or(today),
            Self::Monthly => today.with_day(1).unwrap_or(today),
        };

        start.and_time(NaiveTime::MIN).and_utc()
    }
}

impl std::fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

/// Spend against a period's ceiling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetState {
    pub period: BudgetPeriod,
    /// `None` when no ceiling is configured
    pub limit_usd: Option<f64>,
    pub spent_usd: f64,
    pub remaining_usd: Option<f64>,
    /// Remaining share of the ceiling in `[0, 1]`, 1.0 when unlimited
    pub remaining_fraction: f64,
}

impl BudgetState {
    pub fn new(period: BudgetPeriod, limit_usd: Option<f64>, spent_usd: f64) -> Self {
        match limit_usd.filter(|limit| *limit > 0.0) {
            Some(limit) => {
                let remaining = limit - spent_usd;
                Self {
                    period,
                    limit_usd: Some(limit),
                    spent_usd,
                    remaining_usd: Some(remaining),
                    remaining_fraction: (remaining / limit).clamp(0.0, 1.0),
                }
            }
            None => Self::unlimited(period, spent_usd),
        }
    }

    pub fn unlimited(period: BudgetPeriod, spent_usd: f64) -> Self {
        Self {
            period,
            limit_usd: None,
            spent_usd,
            remaining_usd: None,
            remaining_fraction: 1.0,
        }
    }

    /// Nothing left to spend
    pub fn is_exhausted(&self) -> bool {
        self.remaining_usd.is_some_and(|remaining| remaining <= 0.0)
    }

    pub fn is_below(&self, floor_fraction: f64) -> bool {
        self.limit_usd.is_some() && self.remaining_fraction < floor_fraction
    }

    /// Percentage of the ceiling spent, `None` when unlimited
    pub fn used_percent(&self) -> Option<f64> {
        self.limit_usd.map(|limit| self.spent_usd / limit * 100.0)
    }
}

/// A configured alert threshold that current spend has crossed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostAlert {
    pub period: BudgetPeriod,
    pub threshold_percent: u8,
    pub spent_usd: f64,
    pub limit_usd: f64,
    pub message: String,
}

impl CostAlert {
    pub fn new(period: BudgetPeriod, threshold_percent: u8, spent_usd: f64, limit_usd: f64) -> Self {
        Self {
            period,
            threshold_percent,
            spent_usd,
            limit_usd,
            message: format!(
                "{} spend ${:.2} reached {}% of the ${:.2} budget",
                period, spent_usd, threshold_percent, limit_usd
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_period_starts() {
        // Thursday
        let now = Utc.with_ymd_and_hms(2024, 5, 16, 13, 45, 0).unwrap();

        assert_eq!(
            BudgetPeriod::Daily.start_at(now),
            Utc.with_ymd_and_hms(2024, 5, 16, 0, 0, 0).unwrap()
        );
        assert_eq!(
            BudgetPeriod::Weekly.start_at(now),
            Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap()
        );
        assert_eq!(
            BudgetPeriod::Monthly.start_at(now),
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_budget_state_fraction() {
        let state = BudgetState::new(BudgetPeriod::Daily, Some(100.0), 95.0);

        assert_eq!(state.remaining_usd, Some(5.0));
        assert!((state.remaining_fraction - 0.05).abs() < 1e-12);
        assert!(state.is_below(0.10));
        assert!(!state.is_exhausted());
    }

    #[test]
    fn test_overspent_budget_is_exhausted() {
        let state = BudgetState::new(BudgetPeriod::Monthly, Some(10.0), 12.0);

        assert!(state.is_exhausted());
        assert_eq!(state.remaining_fraction, 0.0);
        assert_eq!(state.used_percent(), Some(120.0));
    }

    #[test]
    fn test_unlimited_budget() {
        let state = BudgetState::new(BudgetPeriod::Daily, None, 1_000.0);

        assert!(!state.is_exhausted());
        assert!(!state.is_below(0.10));
        assert_eq!(state.remaining_fraction, 1.0);

        let zero = BudgetState::new(BudgetPeriod::Daily, Some(0.0), 1.0);
        assert_eq!(zero.limit_usd, None);
    }
}
