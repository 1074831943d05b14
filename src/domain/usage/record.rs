//! Usage records and aggregate statistics

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// One successful model invocation. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub model_name: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    /// Cost in USD
    pub cost: f64,
    pub timestamp: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(
        model_name: impl Into<String>,
        prompt_tokens: u32,
        completion_tokens: u32,
        cost: f64,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            prompt_tokens,
            completion_tokens,
            cost,
            timestamp: Utc::now(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens as u64 + self.completion_tokens as u64
    }
}

/// Trailing time window for statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatsWindow {
    #[serde(rename = "1h")]
    LastHour,
    #[default]
    #[serde(rename = "24h")]
    LastDay,
    #[serde(rename = "7d")]
    LastWeek,
    #[serde(rename = "30d")]
    LastMonth,
    #[serde(rename = "all")]
    All,
}

impl StatsWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LastHour => "1h",
            Self::LastDay => "24h",
            Self::LastWeek => "7d",
            Self::LastMonth => "30d",
            Self::All => "all",
        }
    }

    /// Inclusive lower bound of the window ending at `now`
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let span = match self {
            Self::LastHour => TimeDelta::hours(1),
            Self::LastDay => TimeDelta::days(1),
            Self::LastWeek => TimeDelta::days(7),
            Self::LastMonth => TimeDelta::days(30),
            Self::All => return None,
        };
        Some(now - span)
    }
}

impl FromStr for StatsWindow {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1h" | "hour" => Ok(Self::LastHour),
            "24h" | "1d" | "day" | "daily" => Ok(Self::LastDay),
            "7d" | "week" | "weekly" => Ok(Self::LastWeek),
            "30d" | "month" | "monthly" => Ok(Self::LastMonth),
            "all" => Ok(Self::All),
            other => Err(DomainError::validation(format!(
                "Unknown stats period '{}', expected one of 1h, 24h, 7d, 30d, all",
                other
            ))),
        }
    }
}

/// Per-model totals inside a window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelUsage {
    pub requests: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_cost: f64,
    pub avg_cost_per_request: f64,
}

impl ModelUsage {
    pub fn add(&mut self, record: &UsageRecord) {
        self.requests += 1;
        self.prompt_tokens += record.prompt_tokens as u64;
        self.completion_tokens += record.completion_tokens as u64;
        self.total_cost += record.cost;
        self.avg_cost_per_request = self.total_cost / self.requests as f64;
    }
}

/// Aggregate over a time window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub period: String,
    pub total_cost: f64,
    pub total_requests: u64,
    pub total_tokens: u64,
    pub avg_cost_per_request: f64,
    pub per_model: BTreeMap<String, ModelUsage>,
}

impl UsageStats {
    /// Aggregate the given records under the `period` label
    pub fn from_records<'a>(
        period: impl Into<String>,
        records: impl IntoIterator<Item = &'a UsageRecord>,
    ) -> Self {
        let mut stats = Self {
            period: period.into(),
            ..Self::default()
        };

        for record in records {
            stats.total_cost += record.cost;
            stats.total_requests += 1;
            stats.total_tokens += record.total_tokens();
            stats
                .per_model
                .entry(record.model_name.clone())
                .or_default()
                .add(record);
        }

        if stats.total_requests > 0 {
            stats.avg_cost_per_request = stats.total_cost / stats.total_requests as f64;
        }

        stats
    }
}
