//! FinOps endpoint types

use serde::{Deserialize, Serialize};

use crate::domain::usage::{CostAlert, OptimizationSuggestion, StatsWindow};
use crate::domain::DomainError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsQuery {
    /// `1h`, `24h`, `7d`, `30d` or `all`; defaults to `24h`
    #[serde(default)]
    pub period: Option<String>,
}

impl StatsQuery {
    pub fn window(&self) -> Result<StatsWindow, DomainError> {
        match self.period.as_deref() {
            None => Ok(StatsWindow::default()),
            Some(period) => period.parse(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastQuery {
    #[serde(default)]
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<OptimizationSuggestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<CostAlert>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_defaults_to_last_day() {
        assert_eq!(StatsQuery::default().window().unwrap(), StatsWindow::LastDay);
    }

    #[test]
    fn test_unknown_period_rejected() {
        let query = StatsQuery {
            period: Some("fortnight".to_string()),
        };
        assert!(query.window().is_err());
    }
}
