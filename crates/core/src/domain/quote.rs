use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::plan::PlanType;
use crate::domain::selection::{BrandingReadiness, ContactDetails, DesignStyle};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

impl QuoteId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    #[default]
    Pending,
    Contacted,
    Negotiating,
    Approved,
    Rejected,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Contacted => "contacted",
            Self::Negotiating => "negotiating",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Final price and negotiation notes are only meaningful once talks started.
    pub fn accepts_negotiation_fields(&self) -> bool {
        matches!(self, Self::Negotiating | Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "contacted" => Ok(Self::Contacted),
            "negotiating" => Ok(Self::Negotiating),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown quotation status `{other}`")),
        }
    }
}

/// Selection fields frozen at submission time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    pub plan: PlanType,
    pub contact: ContactDetails,
    pub pages: Vec<String>,
    pub design: DesignStyle,
    pub colors: Vec<String>,
    pub animations: Vec<String>,
    pub features: Vec<String>,
    pub deadline_weeks: u8,
    pub notes: Option<String>,
    pub competitors: Option<String>,
    pub branding: Option<BrandingReadiness>,
    pub estimated_price: Decimal,
}

/// A validated submission that has not been assigned an identifier yet.
///
/// Lifecycle fields are not representable here: every quotation starts out
/// pending, without final price or notes, and negotiable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuotation {
    #[serde(flatten)]
    pub snapshot: QuoteSnapshot,
    pub submission_date: DateTime<Utc>,
}

impl NewQuotation {
    pub fn into_quotation(self, id: QuoteId) -> Quotation {
        Quotation {
            id,
            snapshot: self.snapshot,
            submission_date: self.submission_date,
            status: QuoteStatus::Pending,
            negotiation_notes: None,
            final_price: None,
            negotiable: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: QuoteId,
    #[serde(flatten)]
    pub snapshot: QuoteSnapshot,
    pub submission_date: DateTime<Utc>,
    pub status: QuoteStatus,
    pub negotiation_notes: Option<String>,
    pub final_price: Option<Decimal>,
    pub negotiable: bool,
}

impl Quotation {
    pub fn apply_patch(&mut self, patch: &QuotationPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = &patch.negotiation_notes {
            self.negotiation_notes = Some(notes.clone());
        }
        if let Some(final_price) = patch.final_price {
            self.final_price = Some(final_price);
        }
        if let Some(negotiable) = patch.negotiable {
            self.negotiable = negotiable;
        }
    }
}

/// Partial update of the negotiation fields, as persisted by the quote store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationPatch {
    pub status: Option<QuoteStatus>,
    pub negotiation_notes: Option<String>,
    pub final_price: Option<Decimal>,
    pub negotiable: Option<bool>,
}

impl QuotationPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.negotiation_notes.is_none()
            && self.final_price.is_none()
            && self.negotiable.is_none()
    }
}
