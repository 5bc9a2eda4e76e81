pub mod catalog;
pub mod constraints;
pub mod pricing;
pub mod selection;

use serde::{Deserialize, Serialize};

use self::{
    catalog::CatalogEntry,
    constraints::{ConstraintEngine, ConstraintResult, DeterministicConstraintEngine},
    pricing::{DeterministicPricingEngine, PricingEngine, PricingResult},
};
use crate::domain::selection::SelectionState;

/// Combined validity and price breakdown of a draft, as shown before submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEvaluation {
    pub constraints: ConstraintResult,
    pub pricing: PricingResult,
}

pub trait CpqRuntime: Send + Sync {
    fn evaluate_selection(
        &self,
        entry: &CatalogEntry,
        selection: &SelectionState,
    ) -> SelectionEvaluation;
}

pub struct DeterministicCpqRuntime<C, P> {
    constraint_engine: C,
    pricing_engine: P,
}

impl<C, P> DeterministicCpqRuntime<C, P> {
    pub fn new(constraint_engine: C, pricing_engine: P) -> Self {
        Self { constraint_engine, pricing_engine }
    }
}

impl Default for DeterministicCpqRuntime<DeterministicConstraintEngine, DeterministicPricingEngine> {
    fn default() -> Self {
        Self::new(DeterministicConstraintEngine, DeterministicPricingEngine)
    }
}

impl<C, P> CpqRuntime for DeterministicCpqRuntime<C, P>
where
    C: ConstraintEngine,
    P: PricingEngine,
{
    fn evaluate_selection(
        &self,
        entry: &CatalogEntry,
        selection: &SelectionState,
    ) -> SelectionEvaluation {
        SelectionEvaluation {
            constraints: self.constraint_engine.validate(entry, selection),
            pricing: self.pricing_engine.price(entry, selection),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::cpq::{
        catalog::{Catalog, CatalogEntry},
        constraints::{ConstraintEngine, ConstraintResult, DeterministicConstraintEngine},
        pricing::{DeterministicPricingEngine, PricingEngine},
        selection::SelectionManager,
        CpqRuntime, DeterministicCpqRuntime,
    };
    use crate::domain::{plan::PlanType, selection::SelectionState};

    #[test]
    fn deterministic_runtime_reports_constraints_and_price() {
        let catalog = Catalog::standard();
        let entry = catalog.entry(PlanType::Basic).expect("basic");
        let draft = SelectionManager::new(catalog).new_draft(PlanType::Basic).expect("draft");

        let evaluation = DeterministicCpqRuntime::default().evaluate_selection(entry, &draft);

        // blank contact details are the only problem with a fresh draft
        assert!(!evaluation.constraints.valid);
        assert!(evaluation.constraints.violations.iter().all(|v| v.code == "MISSING_CONTACT_FIELD"));
        assert_eq!(evaluation.pricing.total, Decimal::from(12_000));
    }

    #[test]
    fn runtime_supports_explicit_engine_interfaces() {
        struct RejectEverything;

        impl ConstraintEngine for RejectEverything {
            fn validate(&self, _entry: &CatalogEntry, _selection: &SelectionState) -> ConstraintResult {
                ConstraintResult { valid: false, violations: Vec::new() }
            }
        }

        let catalog = Catalog::standard();
        let entry = catalog.entry(PlanType::Advanced).expect("advanced");
        let draft = SelectionManager::new(catalog).new_draft(PlanType::Advanced).expect("draft");

        let runtime = DeterministicCpqRuntime::new(RejectEverything, DeterministicPricingEngine);
        let evaluation = runtime.evaluate_selection(entry, &draft);

        assert!(!evaluation.constraints.valid);
        assert_eq!(evaluation.pricing, DeterministicPricingEngine.price(entry, &draft));
        assert!(DeterministicConstraintEngine.validate(entry, &draft).violations.len() >= 4);
    }
}
