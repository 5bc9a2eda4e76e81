use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::cpq::catalog::CatalogEntry;
use crate::domain::plan::PlanType;
use crate::domain::selection::{SelectionState, URGENT_DELIVERY};

pub const MISSING_CONTACT_FIELD: &str = "MISSING_CONTACT_FIELD";
pub const MISSING_FIXED_PAGE: &str = "MISSING_FIXED_PAGE";
pub const UNKNOWN_PAGE: &str = "UNKNOWN_PAGE";
pub const PAGE_LIMIT_EXCEEDED: &str = "PAGE_LIMIT_EXCEEDED";
pub const COLOR_LIMIT_EXCEEDED: &str = "COLOR_LIMIT_EXCEEDED";
pub const DUPLICATE_SELECTION: &str = "DUPLICATE_SELECTION";
pub const ANIMATIONS_NOT_SUPPORTED: &str = "ANIMATIONS_NOT_SUPPORTED";
pub const ANIMATION_LIMIT_EXCEEDED: &str = "ANIMATION_LIMIT_EXCEEDED";
pub const UNKNOWN_FEATURE: &str = "UNKNOWN_FEATURE";
pub const INVALID_DEADLINE: &str = "INVALID_DEADLINE";
pub const UNSUPPORTED_DESIGN: &str = "UNSUPPORTED_DESIGN";
pub const ADVANCED_ONLY_FIELD: &str = "ADVANCED_ONLY_FIELD";
pub const NEGATIVE_FINAL_PRICE: &str = "NEGATIVE_FINAL_PRICE";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub code: String,
    pub message: String,
    pub suggestion: Option<String>,
    /// Offending key, when the violation is about one option.
    pub subject: Option<String>,
}

impl ConstraintViolation {
    pub fn new(code: &str, message: String, suggestion: Option<String>) -> Self {
        Self { code: code.to_string(), message, suggestion, subject: None }
    }

    pub fn about(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintResult {
    pub valid: bool,
    pub violations: Vec<ConstraintViolation>,
}

impl Default for ConstraintResult {
    fn default() -> Self {
        Self { valid: true, violations: Vec::new() }
    }
}

impl ConstraintResult {
    fn push(&mut self, violation: ConstraintViolation) {
        self.valid = false;
        self.violations.push(violation);
    }
}

pub trait ConstraintEngine: Send + Sync {
    fn validate(&self, entry: &CatalogEntry, selection: &SelectionState) -> ConstraintResult;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicConstraintEngine;

impl ConstraintEngine for DeterministicConstraintEngine {
    fn validate(&self, entry: &CatalogEntry, selection: &SelectionState) -> ConstraintResult {
        validate_selection(entry, selection)
    }
}

/// Checks a complete selection against its plan, collecting every violation.
pub fn validate_selection(entry: &CatalogEntry, selection: &SelectionState) -> ConstraintResult {
    let mut result = ConstraintResult::default();

    for field in selection.contact.missing_fields(selection.plan) {
        result.push(
            ConstraintViolation::new(
                MISSING_CONTACT_FIELD,
                format!("Contact field `{field}` is required for the {} plan", selection.plan),
                Some(format!("Provide a non-empty {field}")),
            )
            .about(field),
        );
    }

    for fixed in &entry.fixed_pages {
        if !selection.pages.contains(fixed) {
            result.push(
                ConstraintViolation::new(
                    MISSING_FIXED_PAGE,
                    format!("Page `{fixed}` is always included in the {} plan", entry.plan),
                    None,
                )
                .about(fixed),
            );
        }
    }
    for page in selection.pages.iter().filter(|page| !entry.offers_page(page)) {
        result.push(
            ConstraintViolation::new(
                UNKNOWN_PAGE,
                format!("Page `{page}` is not offered on the {} plan", entry.plan),
                None,
            )
            .about(page),
        );
    }
    if !entry.page_limit.allows(selection.pages.len()) {
        result.push(ConstraintViolation::new(
            PAGE_LIMIT_EXCEEDED,
            format!("{} pages exceed the {} plan limit", selection.pages.len(), entry.plan),
            Some("Remove optional pages or move to a larger plan".to_string()),
        ));
    }

    if selection.colors.len() > entry.color_limit {
        result.push(ConstraintViolation::new(
            COLOR_LIMIT_EXCEEDED,
            format!(
                "{} colors selected, the {} plan allows {}",
                selection.colors.len(),
                entry.plan,
                entry.color_limit
            ),
            None,
        ));
    }
    check_duplicates(&mut result, "color", &selection.colors);

    if !entry.supports_animations() && !selection.animations.is_empty() {
        result.push(ConstraintViolation::new(
            ANIMATIONS_NOT_SUPPORTED,
            format!("The {} plan does not include animations", entry.plan),
            Some("Choose the intermediate or advanced plan for animations".to_string()),
        ));
    } else if selection.animations.len() > entry.animation_limit {
        result.push(ConstraintViolation::new(
            ANIMATION_LIMIT_EXCEEDED,
            format!(
                "{} animations selected, the {} plan allows {}",
                selection.animations.len(),
                entry.plan,
                entry.animation_limit
            ),
            None,
        ));
    }
    check_duplicates(&mut result, "animation", &selection.animations);

    for feature in selection.features.iter().filter(|f| f.as_str() != URGENT_DELIVERY) {
        if entry.feature_price(feature).is_none() {
            result.push(
                ConstraintViolation::new(
                    UNKNOWN_FEATURE,
                    format!("Feature `{feature}` is not offered on the {} plan", entry.plan),
                    None,
                )
                .about(feature),
            );
        }
    }

    if entry.deadline(selection.deadline_weeks).is_none() {
        result.push(ConstraintViolation::new(
            INVALID_DEADLINE,
            format!(
                "{}-week delivery is not offered on the {} plan",
                selection.deadline_weeks, entry.plan
            ),
            None,
        ));
    }

    if !entry.offers_design(selection.design) {
        result.push(
            ConstraintViolation::new(
                UNSUPPORTED_DESIGN,
                format!("Design `{}` is not offered on the {} plan", selection.design, entry.plan),
                None,
            )
            .about(selection.design.as_str()),
        );
    }

    if selection.plan != PlanType::Advanced {
        if selection.competitors.is_some() {
            result.push(advanced_only("competitors", selection.plan));
        }
        if selection.branding.is_some() {
            result.push(advanced_only("branding", selection.plan));
        }
    }

    result
}

fn check_duplicates(result: &mut ConstraintResult, kind: &str, values: &[String]) {
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value.as_str()) {
            result.push(
                ConstraintViolation::new(
                    DUPLICATE_SELECTION,
                    format!("The {kind} `{value}` is selected more than once"),
                    None,
                )
                .about(value),
            );
        }
    }
}

fn advanced_only(field: &str, plan: PlanType) -> ConstraintViolation {
    ConstraintViolation::new(
        ADVANCED_ONLY_FIELD,
        format!("`{field}` is only collected for the advanced plan, not {plan}"),
        None,
    )
    .about(field)
}
