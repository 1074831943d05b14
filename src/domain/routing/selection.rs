//! Candidate selection for a classified request

use std::cmp::Ordering;

use super::{IntentTag, ModelDescriptor, RoutingDecision, RoutingReason};
use crate::domain::usage::BudgetState;
use crate::domain::DomainError;

/// Default remaining-budget fraction below which the cheapest model is forced
pub const DEFAULT_BUDGET_FLOOR_FRACTION: f64 = 0.10;

fn by_cost(a: &ModelDescriptor, b: &ModelDescriptor) -> Ordering {
    a.unit_cost()
        .total_cmp(&b.unit_cost())
        .then_with(|| a.tier.cmp(&b.tier))
        .then_with(|| a.name.cmp(&b.name))
}

fn by_intent_tier(intent: IntentTag) -> impl Fn(&ModelDescriptor, &ModelDescriptor) -> Ordering {
    move |a, b| {
        let tier = if intent.prefers_high_tier() {
            b.tier.cmp(&a.tier)
        } else {
            a.tier.cmp(&b.tier)
        };

        tier.then_with(|| a.unit_cost().total_cmp(&b.unit_cost()))
            .then_with(|| a.name.cmp(&b.name))
    }
}

/// Choose a model and fallback chain from `catalog`
///
/// Models declaring the intent's capability are candidates; when none do, the
/// whole catalog is. Unhealthy candidates are dropped. Reasoning orders the
/// rest most capable first, every other intent cheapest tier first. A budget
/// below `budget_floor_fraction` orders by cost instead, and an exhausted
/// budget is terminal unless the cheapest candidate is free.
pub fn select_models(
    catalog: &[ModelDescriptor],
    intent: IntentTag,
    budget: &BudgetState,
    budget_floor_fraction: f64,
) -> Result<RoutingDecision, DomainError> {
    let mut capable: Vec<&ModelDescriptor> =
        catalog.iter().filter(|model| model.supports(intent)).collect();
    if capable.is_empty() {
        capable = catalog.iter().collect();
    }

    let order = by_intent_tier(intent);
    capable.sort_by(|a, b| order(a, b));
    let preferred = capable.first().map(|model| model.name.clone());

    let mut healthy: Vec<ModelDescriptor> = capable
        .into_iter()
        .filter(|model| model.healthy)
        .cloned()
        .collect();

    if healthy.is_empty() {
        let attempted = catalog
            .iter()
            .filter(|model| model.supports(intent))
            .map(|model| model.name.clone())
            .collect();
        return Err(DomainError::all_providers_exhausted(attempted));
    }

    let downgrade = budget.is_exhausted() || budget.is_below(budget_floor_fraction);
    let reason = if downgrade {
        healthy.sort_by(by_cost);

        if budget.is_exhausted() && healthy[0].is_billable() {
            return Err(DomainError::budget_exceeded(format!(
                "{} budget exhausted (spent ${:.2} of ${:.2})",
                budget.period,
                budget.spent_usd,
                budget.limit_usd.unwrap_or_default()
            )));
        }

        RoutingReason::BudgetDowngrade
    } else if preferred.as_deref() != Some(healthy[0].name.as_str()) {
        RoutingReason::HealthFailover
    } else {
        RoutingReason::ClassifiedTier
    };

    let chosen_model = healthy.remove(0);

    Ok(RoutingDecision {
        intent,
        chosen_model,
        fallback_chain: healthy,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::usage::BudgetPeriod;

    fn catalog() -> Vec<ModelDescriptor> {
        use IntentTag::*;
        vec![
            ModelDescriptor::new("mini", 1, "openai")
                .with_costs(0.00000015, 0.0000006)
                .with_capabilities([FastQa, Code, Reasoning]),
            ModelDescriptor::new("standard", 2, "openai")
                .with_costs(0.0000025, 0.00001)
                .with_capabilities([FastQa, Code, Reasoning, Vision]),
            ModelDescriptor::new("frontier", 3, "anthropic")
                .with_costs(0.000015, 0.000075)
                .with_capabilities([Reasoning, Code]),
        ]
    }

    fn unlimited() -> BudgetState {
        BudgetState::unlimited(BudgetPeriod::Daily, 0.0)
    }

    #[test]
    fn test_reasoning_prefers_highest_tier() {
        let decision =
            select_models(&catalog(), IntentTag::Reasoning, &unlimited(), 0.10).unwrap();

        assert_eq!(decision.chosen_model.name, "frontier");
        assert_eq!(decision.candidate_names(), vec!["frontier", "standard", "mini"]);
        assert_eq!(decision.reason, RoutingReason::ClassifiedTier);
    }

    #[test]
    fn test_fast_qa_prefers_lowest_tier() {
        let decision = select_models(&catalog(), IntentTag::FastQa, &unlimited(), 0.10).unwrap();

        assert_eq!(decision.candidate_names(), vec!["mini", "standard"]);
    }

    #[test]
    fn test_capability_filter() {
        let decision = select_models(&catalog(), IntentTag::Vision, &unlimited(), 0.10).unwrap();

        assert_eq!(decision.candidate_names(), vec!["standard"]);
    }

    #[test]
    fn test_low_budget_forces_cheapest_for_every_intent() {
        let budget = BudgetState::new(BudgetPeriod::Daily, Some(100.0), 95.0);

        for intent in [IntentTag::Reasoning, IntentTag::Code, IntentTag::FastQa] {
            let decision = select_models(&catalog(), intent, &budget, 0.10).unwrap();
            assert_eq!(decision.chosen_model.name, "mini");
            assert_eq!(decision.reason, RoutingReason::BudgetDowngrade);
        }
    }

    #[test]
    fn test_budget_above_floor_keeps_tier() {
        let budget = BudgetState::new(BudgetPeriod::Daily, Some(100.0), 50.0);

        let decision = select_models(&catalog(), IntentTag::Reasoning, &budget, 0.10).unwrap();
        assert_eq!(decision.chosen_model.name, "frontier");
    }

    #[test]
    fn test_exhausted_budget_is_terminal_for_billable_models() {
        let budget = BudgetState::new(BudgetPeriod::Monthly, Some(10.0), 10.0);

        let err = select_models(&catalog(), IntentTag::FastQa, &budget, 0.10).unwrap_err();
        assert!(matches!(err, DomainError::BudgetExceeded { .. }));
    }

    #[test]
    fn test_exhausted_budget_allows_free_model() {
        let mut models = catalog();
        models.push(
            ModelDescriptor::new("local", 1, "echo").with_capabilities([IntentTag::FastQa]),
        );
        let budget = BudgetState::new(BudgetPeriod::Monthly, Some(10.0), 12.0);

        let decision = select_models(&models, IntentTag::FastQa, &budget, 0.10).unwrap();
        assert_eq!(decision.chosen_model.name, "local");
        assert_eq!(decision.reason, RoutingReason::BudgetDowngrade);
    }

    #[test]
    fn test_unhealthy_preferred_model_fails_over() {
        let mut models = catalog();
        models[2].healthy = false;

        let decision = select_models(&models, IntentTag::Reasoning, &unlimited(), 0.10).unwrap();

        assert_eq!(decision.chosen_model.name, "standard");
        assert_eq!(decision.reason, RoutingReason::HealthFailover);
        assert!(!decision.candidate_names().contains(&"frontier".to_string()));
    }

    #[test]
    fn test_no_healthy_candidates() {
        let models: Vec<_> = catalog().into_iter().map(|m| m.with_healthy(false)).collect();

        let err = select_models(&models, IntentTag::Code, &unlimited(), 0.10).unwrap_err();
        match err {
            DomainError::AllProvidersExhausted { attempted } => {
                assert_eq!(attempted.len(), 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_capability_uses_whole_catalog() {
        let models = vec![ModelDescriptor::new("generalist", 2, "openai")];

        let decision = select_models(&models, IntentTag::Vision, &unlimited(), 0.10).unwrap();
        assert_eq!(decision.chosen_model.name, "generalist");
    }
}
