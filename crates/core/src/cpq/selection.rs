//! Mutation operations over a [`SelectionState`].
//!
//! Every operation works on a copy, adjusts `estimated_price` incrementally and
//! then checks the copy against a from-scratch recomputation before committing.
//! A failed operation leaves the caller's state untouched.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::catalog::{Catalog, CatalogEntry};
use crate::cpq::constraints::{self, validate_selection};
use crate::cpq::pricing::{DeterministicPricingEngine, PricingEngine, PricingResult};
use crate::domain::plan::PlanType;
use crate::domain::quote::{NewQuotation, QuoteSnapshot};
use crate::domain::selection::{
    BrandingReadiness, ContactDetails, DesignStyle, DraftId, SelectionState, URGENT_DELIVERY,
};
use crate::errors::DomainError;

/// Client edit to a draft, as replayed by the request layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SelectionCommand {
    TogglePage { page: String, include: bool },
    ToggleColor { color: String },
    ToggleAnimation { animation: String },
    ToggleFeature { feature: String, include: bool },
    SetDeadline { weeks: u8 },
    SetDesign { design: DesignStyle },
    SetContact { contact: ContactDetails },
    SetNotes { notes: Option<String> },
    SetCompetitors { competitors: Option<String> },
    SetBranding { branding: Option<BrandingReadiness> },
}

impl SelectionCommand {
    /// Wire name of the operation, as used in the `op` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TogglePage { .. } => "toggle_page",
            Self::ToggleColor { .. } => "toggle_color",
            Self::ToggleAnimation { .. } => "toggle_animation",
            Self::ToggleFeature { .. } => "toggle_feature",
            Self::SetDeadline { .. } => "set_deadline",
            Self::SetDesign { .. } => "set_design",
            Self::SetContact { .. } => "set_contact",
            Self::SetNotes { .. } => "set_notes",
            Self::SetCompetitors { .. } => "set_competitors",
            Self::SetBranding { .. } => "set_branding",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionOutcome {
    /// False when the request was a no-op, e.g. a color beyond the plan cap.
    pub applied: bool,
    pub estimated_price: Decimal,
}

pub struct SelectionManager<'c, P = DeterministicPricingEngine> {
    catalog: &'c Catalog,
    pricing: P,
}

impl<'c> SelectionManager<'c, DeterministicPricingEngine> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self::with_pricing(catalog, DeterministicPricingEngine)
    }
}

impl<'c, P> SelectionManager<'c, P>
where
    P: PricingEngine,
{
    pub fn with_pricing(catalog: &'c Catalog, pricing: P) -> Self {
        Self { catalog, pricing }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// Fresh draft seeded with the plan's defaults and base price.
    pub fn new_draft(&self, plan: PlanType) -> Result<SelectionState, DomainError> {
        let entry = self.catalog.entry(plan)?;
        let mut state = SelectionState {
            draft_id: DraftId::generate(),
            plan,
            contact: ContactDetails::default(),
            pages: entry.default_pages.iter().cloned().collect(),
            design: DesignStyle::Modern,
            colors: Vec::new(),
            animations: Vec::new(),
            features: BTreeSet::new(),
            deadline_weeks: entry.default_deadline_weeks,
            notes: None,
            competitors: None,
            branding: (plan == PlanType::Advanced).then_some(BrandingReadiness::Partial),
            estimated_price: Decimal::ZERO,
        };
        state.estimated_price = self.pricing.price(entry, &state).total;
        Ok(state)
    }

    pub fn price(&self, state: &SelectionState) -> Result<PricingResult, DomainError> {
        let entry = self.catalog.entry(state.plan)?;
        Ok(self.pricing.price(entry, state))
    }

    pub fn toggle_page(
        &self,
        state: &mut SelectionState,
        page: &str,
        include: bool,
    ) -> Result<SelectionOutcome, DomainError> {
        let entry = self.catalog.entry(state.plan)?;
        if entry.is_fixed_page(page) {
            return Err(DomainError::ImmutablePage { page: page.to_owned() });
        }
        if include && !entry.offers_page(page) {
            return Err(DomainError::UnknownPage { page: page.to_owned(), plan: state.plan });
        }

        let mut next = state.clone();
        let applied =
            if include { next.pages.insert(page.to_owned()) } else { next.pages.remove(page) };
        self.commit(entry, state, next, applied)
    }

    pub fn toggle_color(
        &self,
        state: &mut SelectionState,
        color: &str,
    ) -> Result<SelectionOutcome, DomainError> {
        let entry = self.catalog.entry(state.plan)?;
        let mut next = state.clone();
        let applied = toggle_capped(&mut next.colors, color, entry.color_limit);
        self.commit(entry, state, next, applied)
    }

    pub fn toggle_animation(
        &self,
        state: &mut SelectionState,
        animation: &str,
    ) -> Result<SelectionOutcome, DomainError> {
        let entry = self.catalog.entry(state.plan)?;
        if !entry.supports_animations() {
            return Err(DomainError::UnsupportedOperation {
                operation: "animation selection".to_owned(),
                plan: state.plan,
            });
        }

        let mut next = state.clone();
        let was_selected = next.animations.iter().any(|selected| selected == animation);
        let applied = toggle_capped(&mut next.animations, animation, entry.animation_limit);
        if applied {
            let delta = entry.animation_price(animation);
            if was_selected {
                next.estimated_price -= delta;
            } else {
                next.estimated_price += delta;
            }
        }
        self.commit(entry, state, next, applied)
    }

    pub fn toggle_feature(
        &self,
        state: &mut SelectionState,
        feature: &str,
        include: bool,
    ) -> Result<SelectionOutcome, DomainError> {
        let entry = self.catalog.entry(state.plan)?;
        let delta = entry.feature_price(feature).ok_or_else(|| DomainError::UnknownFeature {
            feature: feature.to_owned(),
            plan: state.plan,
        })?;

        let mut next = state.clone();
        let applied = if include {
            let added = next.features.insert(feature.to_owned());
            if added {
                next.estimated_price += delta;
            }
            added
        } else {
            let removed = next.features.remove(feature);
            if removed {
                next.estimated_price -= delta;
            }
            removed
        };
        self.commit(entry, state, next, applied)
    }

    /// Selecting the urgent option raises the urgent-delivery flag and its
    /// surcharge; leaving it clears both. Nothing else sets that flag.
    pub fn set_deadline(
        &self,
        state: &mut SelectionState,
        weeks: u8,
    ) -> Result<SelectionOutcome, DomainError> {
        let entry = self.catalog.entry(state.plan)?;
        let option = entry
            .deadline(weeks)
            .ok_or(DomainError::InvalidDeadline { weeks, plan: state.plan })?;
        let previous = entry.deadline(state.deadline_weeks);

        let mut next = state.clone();
        next.deadline_weeks = weeks;
        if option.is_urgent {
            if next.features.insert(URGENT_DELIVERY.to_owned()) {
                next.estimated_price += option.urgent_surcharge;
            }
        } else if next.features.remove(URGENT_DELIVERY) {
            let reversed = previous
                .filter(|previous| previous.is_urgent)
                .map(|previous| previous.urgent_surcharge)
                .unwrap_or(Decimal::ZERO);
            next.estimated_price -= reversed;
        }

        let applied = state.deadline_weeks != weeks;
        self.commit(entry, state, next, applied)
    }

    pub fn set_design(
        &self,
        state: &mut SelectionState,
        design: DesignStyle,
    ) -> Result<SelectionOutcome, DomainError> {
        let entry = self.catalog.entry(state.plan)?;
        if !entry.offers_design(design) {
            return Err(DomainError::UnsupportedDesign { design, plan: state.plan });
        }

        let mut next = state.clone();
        next.design = design;
        let applied = state.design != design;
        self.commit(entry, state, next, applied)
    }

    pub fn set_contact(
        &self,
        state: &mut SelectionState,
        contact: ContactDetails,
    ) -> Result<SelectionOutcome, DomainError> {
        let entry = self.catalog.entry(state.plan)?;
        let mut next = state.clone();
        next.contact = contact;
        self.commit(entry, state, next, true)
    }

    pub fn set_notes(
        &self,
        state: &mut SelectionState,
        notes: Option<String>,
    ) -> Result<SelectionOutcome, DomainError> {
        let entry = self.catalog.entry(state.plan)?;
        let mut next = state.clone();
        next.notes = notes;
        self.commit(entry, state, next, true)
    }

    pub fn set_competitors(
        &self,
        state: &mut SelectionState,
        competitors: Option<String>,
    ) -> Result<SelectionOutcome, DomainError> {
        let entry = self.advanced_entry(state, "competitor references")?;
        let mut next = state.clone();
        next.competitors = competitors;
        self.commit(entry, state, next, true)
    }

    pub fn set_branding(
        &self,
        state: &mut SelectionState,
        branding: Option<BrandingReadiness>,
    ) -> Result<SelectionOutcome, DomainError> {
        let entry = self.advanced_entry(state, "branding readiness")?;
        let mut next = state.clone();
        next.branding = branding;
        self.commit(entry, state, next, true)
    }

    pub fn apply(
        &self,
        state: &mut SelectionState,
        command: SelectionCommand,
    ) -> Result<SelectionOutcome, DomainError> {
        match command {
            SelectionCommand::TogglePage { page, include } => {
                self.toggle_page(state, &page, include)
            }
            SelectionCommand::ToggleColor { color } => self.toggle_color(state, &color),
            SelectionCommand::ToggleAnimation { animation } => {
                self.toggle_animation(state, &animation)
            }
            SelectionCommand::ToggleFeature { feature, include } => {
                self.toggle_feature(state, &feature, include)
            }
            SelectionCommand::SetDeadline { weeks } => self.set_deadline(state, weeks),
            SelectionCommand::SetDesign { design } => self.set_design(state, design),
            SelectionCommand::SetContact { contact } => self.set_contact(state, contact),
            SelectionCommand::SetNotes { notes } => self.set_notes(state, notes),
            SelectionCommand::SetCompetitors { competitors } => {
                self.set_competitors(state, competitors)
            }
            SelectionCommand::SetBranding { branding } => self.set_branding(state, branding),
        }
    }

    /// Validates a finished selection and freezes it into a new quotation.
    ///
    /// The submitted price is always recomputed; fixed pages and the
    /// urgent-delivery flag are normalized from the plan and deadline.
    pub fn submit(
        &self,
        mut selection: SelectionState,
        submitted_at: DateTime<Utc>,
    ) -> Result<NewQuotation, DomainError> {
        let entry = self.catalog.entry(selection.plan)?;

        selection.pages.extend(entry.fixed_pages.iter().cloned());
        let urgent = entry.deadline(selection.deadline_weeks).is_some_and(|option| option.is_urgent);
        if urgent {
            selection.features.insert(URGENT_DELIVERY.to_owned());
        } else {
            selection.features.remove(URGENT_DELIVERY);
        }

        let result = validate_selection(entry, &selection);
        if !result.valid {
            return Err(first_typed_error(&selection, &result.violations)
                .unwrap_or(DomainError::Validation { violations: result.violations }));
        }

        selection.estimated_price = self.pricing.price(entry, &selection).total;

        Ok(NewQuotation {
            snapshot: QuoteSnapshot {
                plan: selection.plan,
                contact: selection.contact,
                pages: selection.pages.into_iter().collect(),
                design: selection.design,
                colors: selection.colors,
                animations: selection.animations,
                features: selection.features.into_iter().collect(),
                deadline_weeks: selection.deadline_weeks,
                notes: selection.notes,
                competitors: selection.competitors,
                branding: selection.branding,
                estimated_price: selection.estimated_price,
            },
            submission_date: submitted_at,
        })
    }

    fn advanced_entry(
        &self,
        state: &SelectionState,
        operation: &str,
    ) -> Result<&'c CatalogEntry, DomainError> {
        if state.plan != PlanType::Advanced {
            return Err(DomainError::UnsupportedOperation {
                operation: operation.to_owned(),
                plan: state.plan,
            });
        }
        self.catalog.entry(state.plan)
    }

    fn commit(
        &self,
        entry: &CatalogEntry,
        state: &mut SelectionState,
        next: SelectionState,
        applied: bool,
    ) -> Result<SelectionOutcome, DomainError> {
        let recomputed = self.pricing.price(entry, &next).total;
        if recomputed != next.estimated_price {
            return Err(DomainError::InvariantViolation(format!(
                "estimated price drifted for draft {}: incremental {} vs recomputed {}",
                next.draft_id.0, next.estimated_price, recomputed
            )));
        }

        *state = next;
        Ok(SelectionOutcome { applied, estimated_price: recomputed })
    }
}

/// Removes a selected value, or appends it while under `limit`.
fn toggle_capped(selected: &mut Vec<String>, value: &str, limit: usize) -> bool {
    if let Some(position) = selected.iter().position(|existing| existing == value) {
        selected.remove(position);
        return true;
    }
    if selected.len() < limit {
        selected.push(value.to_owned());
        return true;
    }
    false
}

fn first_typed_error(
    selection: &SelectionState,
    violations: &[constraints::ConstraintViolation],
) -> Option<DomainError> {
    let plan = selection.plan;
    violations.iter().find_map(|violation| match violation.code.as_str() {
        constraints::UNKNOWN_PAGE => Some(DomainError::UnknownPage {
            page: violation.subject.clone().unwrap_or_default(),
            plan,
        }),
        constraints::UNKNOWN_FEATURE => Some(DomainError::UnknownFeature {
            feature: violation.subject.clone().unwrap_or_default(),
            plan,
        }),
        constraints::INVALID_DEADLINE => {
            Some(DomainError::InvalidDeadline { weeks: selection.deadline_weeks, plan })
        }
        constraints::UNSUPPORTED_DESIGN => {
            Some(DomainError::UnsupportedDesign { design: selection.design, plan })
        }
        constraints::ANIMATIONS_NOT_SUPPORTED => Some(DomainError::UnsupportedOperation {
            operation: "animation selection".to_owned(),
            plan,
        }),
        _ => None,
    })
}
