use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::{QuoteId, QuoteStatus, QuotationPatch};

/// Negotiation-field changes requested alongside a status change.
/// `None` leaves the stored value as it is.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationFields {
    #[serde(default)]
    pub final_price: Option<Decimal>,
    #[serde(default)]
    pub negotiation_notes: Option<String>,
    #[serde(default)]
    pub negotiable: Option<bool>,
}

impl NegotiationFields {
    pub fn is_empty(&self) -> bool {
        self.final_price.is_none() && self.negotiation_notes.is_none() && self.negotiable.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOutcome {
    pub quote_id: QuoteId,
    pub from: QuoteStatus,
    pub to: QuoteStatus,
    /// Exactly the fields the store has to persist for this change.
    pub patch: QuotationPatch,
}
