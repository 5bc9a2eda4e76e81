use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::plan::PlanType;

/// Feature key the urgent surcharge is tracked under in `SelectionState::features`.
pub const URGENT_DELIVERY: &str = "urgent-delivery";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraftId(pub String);

impl DraftId {
    pub fn generate() -> Self {
        Self(format!("DRAFT-{}", Uuid::new_v4().simple()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesignStyle {
    Modern,
    Elegant,
    Minimalist,
    Luxury,
    Corporate,
    Creative,
    Custom,
}

impl DesignStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Modern => "modern",
            Self::Elegant => "elegant",
            Self::Minimalist => "minimalist",
            Self::Luxury => "luxury",
            Self::Corporate => "corporate",
            Self::Creative => "creative",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for DesignStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DesignStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "modern" => Ok(Self::Modern),
            "elegant" => Ok(Self::Elegant),
            "minimalist" => Ok(Self::Minimalist),
            "luxury" => Ok(Self::Luxury),
            "corporate" => Ok(Self::Corporate),
            "creative" => Ok(Self::Creative),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown design style `{other}`")),
        }
    }
}

/// Whether an advanced-plan client already owns brand material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrandingReadiness {
    Yes,
    Partial,
    No,
}

impl BrandingReadiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::Partial => "partial",
            Self::No => "no",
        }
    }
}

impl FromStr for BrandingReadiness {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(Self::Yes),
            "partial" => Ok(Self::Partial),
            "no" => Ok(Self::No),
            other => Err(format!("unknown branding readiness `{other}`")),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

impl ContactDetails {
    /// Names of required contact fields that are blank for the given plan.
    pub fn missing_fields(&self, plan: PlanType) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.email.trim().is_empty() {
            missing.push("email");
        }
        if self.phone.trim().is_empty() {
            missing.push("phone");
        }
        let company_blank = self.company.as_deref().map(str::trim).unwrap_or_default().is_empty();
        if plan == PlanType::Advanced && company_blank {
            missing.push("company");
        }
        missing
    }
}

/// In-progress configuration of one quote draft.
///
/// `estimated_price` is derived: it always equals what the pricing engine
/// computes from the other fields, and is recomputed on submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub draft_id: DraftId,
    pub plan: PlanType,
    pub contact: ContactDetails,
    pub pages: BTreeSet<String>,
    pub design: DesignStyle,
    pub colors: Vec<String>,
    pub animations: Vec<String>,
    pub features: BTreeSet<String>,
    pub deadline_weeks: u8,
    pub notes: Option<String>,
    pub competitors: Option<String>,
    pub branding: Option<BrandingReadiness>,
    pub estimated_price: Decimal,
}

impl SelectionState {
    pub fn has_urgent_delivery(&self) -> bool {
        self.features.contains(URGENT_DELIVERY)
    }

    /// Features a client picked, without the deadline-driven urgent flag.
    pub fn chosen_features(&self) -> impl Iterator<Item = &String> {
        self.features.iter().filter(|feature| feature.as_str() != URGENT_DELIVERY)
    }
}
