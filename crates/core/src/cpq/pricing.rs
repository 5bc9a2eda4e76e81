use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::catalog::CatalogEntry;
use crate::domain::plan::PlanType;
use crate::domain::selection::SelectionState;

pub const DEFAULT_CURRENCY: &str = "MXN";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTrace {
    pub plan: PlanType,
    pub currency: String,
    pub steps: Vec<PricingTraceStep>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub base_price: Decimal,
    pub features_total: Decimal,
    pub animations_total: Decimal,
    pub urgent_surcharge: Decimal,
    pub total: Decimal,
    pub trace: PricingTrace,
}

pub trait PricingEngine: Send + Sync {
    fn price(&self, entry: &CatalogEntry, selection: &SelectionState) -> PricingResult;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicPricingEngine;

impl PricingEngine for DeterministicPricingEngine {
    fn price(&self, entry: &CatalogEntry, selection: &SelectionState) -> PricingResult {
        price_selection_with_trace(entry, selection, DEFAULT_CURRENCY)
    }
}

/// `base + features + animations + urgent surcharge`, with unlisted keys at zero.
pub fn compute_price(entry: &CatalogEntry, selection: &SelectionState) -> Decimal {
    entry.base_price
        + features_total(entry, selection)
        + animations_total(entry, selection)
        + urgent_surcharge(entry, selection)
}

pub fn price_selection_with_trace(
    entry: &CatalogEntry,
    selection: &SelectionState,
    currency: &str,
) -> PricingResult {
    let mut steps = vec![PricingTraceStep {
        stage: "base".to_string(),
        detail: format!("{} plan base price", entry.plan),
        amount: entry.base_price,
    }];

    for feature in selection.chosen_features() {
        steps.push(PricingTraceStep {
            stage: "feature".to_string(),
            detail: feature.clone(),
            amount: entry.feature_price(feature).unwrap_or(Decimal::ZERO),
        });
    }
    for animation in &selection.animations {
        steps.push(PricingTraceStep {
            stage: "animation".to_string(),
            detail: animation.clone(),
            amount: entry.animation_price(animation),
        });
    }

    let urgent = urgent_surcharge(entry, selection);
    if urgent != Decimal::ZERO {
        steps.push(PricingTraceStep {
            stage: "urgent_surcharge".to_string(),
            detail: format!("{}-week delivery", selection.deadline_weeks),
            amount: urgent,
        });
    }

    let features_total = features_total(entry, selection);
    let animations_total = animations_total(entry, selection);

    PricingResult {
        base_price: entry.base_price,
        features_total,
        animations_total,
        urgent_surcharge: urgent,
        total: entry.base_price + features_total + animations_total + urgent,
        trace: PricingTrace { plan: entry.plan, currency: currency.to_string(), steps },
    }
}

fn features_total(entry: &CatalogEntry, selection: &SelectionState) -> Decimal {
    selection
        .chosen_features()
        .map(|feature| entry.feature_price(feature).unwrap_or(Decimal::ZERO))
        .sum()
}

fn animations_total(entry: &CatalogEntry, selection: &SelectionState) -> Decimal {
    selection.animations.iter().map(|animation| entry.animation_price(animation)).sum()
}

fn urgent_surcharge(entry: &CatalogEntry, selection: &SelectionState) -> Decimal {
    entry
        .deadline(selection.deadline_weeks)
        .filter(|option| option.is_urgent)
        .map(|option| option.urgent_surcharge)
        .unwrap_or(Decimal::ZERO)
}
