use rust_decimal::Decimal;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::cpq::constraints::{ConstraintViolation, NEGATIVE_FINAL_PRICE};
use crate::domain::quote::{QuoteStatus, Quotation, QuotationPatch};
use crate::errors::DomainError;
use crate::lifecycle::states::{NegotiationFields, TransitionOutcome};

/// Sole owner of status and negotiation-field changes after submission.
///
/// Any status may follow any non-terminal status. `approved` and `rejected`
/// accept nothing further, not even a negotiable toggle.
#[derive(Clone, Debug, Default)]
pub struct LifecycleManager;

impl LifecycleManager {
    pub fn new() -> Self {
        Self
    }

    /// Checks the change against `record` and applies it in place on success.
    pub fn advance(
        &self,
        record: &mut Quotation,
        next: QuoteStatus,
        fields: &NegotiationFields,
    ) -> Result<TransitionOutcome, DomainError> {
        let from = record.status;
        if from.is_terminal() {
            return Err(DomainError::TerminalState { status: from });
        }

        if !next.accepts_negotiation_fields() {
            if fields.final_price.is_some() {
                return Err(DomainError::InvalidFieldState {
                    field: "finalPrice".to_owned(),
                    status: next,
                });
            }
            if fields.negotiation_notes.is_some() {
                return Err(DomainError::InvalidFieldState {
                    field: "negotiationNotes".to_owned(),
                    status: next,
                });
            }
        }

        if let Some(price) = fields.final_price {
            if price < Decimal::ZERO {
                return Err(DomainError::Validation {
                    violations: vec![ConstraintViolation::new(
                        NEGATIVE_FINAL_PRICE,
                        format!("Final price {price} cannot be negative"),
                        Some("Agree on a price of zero or more".to_owned()),
                    )
                    .about("finalPrice")],
                });
            }
        }

        let patch = QuotationPatch {
            status: (next != from).then_some(next),
            negotiation_notes: fields.negotiation_notes.clone(),
            final_price: fields.final_price,
            negotiable: fields.negotiable,
        };
        record.apply_patch(&patch);

        Ok(TransitionOutcome { quote_id: record.id.clone(), from, to: next, patch })
    }

    /// Updates negotiation fields without moving the status.
    pub fn amend(
        &self,
        record: &mut Quotation,
        fields: &NegotiationFields,
    ) -> Result<TransitionOutcome, DomainError> {
        let current = record.status;
        self.advance(record, current, fields)
    }

    pub fn advance_with_audit<S>(
        &self,
        record: &mut Quotation,
        next: QuoteStatus,
        fields: &NegotiationFields,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, DomainError>
    where
        S: AuditSink + ?Sized,
    {
        let from = record.status;
        let result = self.advance(record, next, fields);
        let context = AuditContext {
            quote_id: Some(record.id.clone()),
            correlation_id: audit.correlation_id.clone(),
            actor: audit.actor.clone(),
        };
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        &context,
                        "lifecycle.transition_applied",
                        AuditCategory::Lifecycle,
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", outcome.from.as_str())
                    .with_metadata("to", outcome.to.as_str())
                    .with_metadata("final_price_set", outcome.patch.final_price.is_some().to_string()),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        &context,
                        "lifecycle.transition_rejected",
                        AuditCategory::Lifecycle,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("from", from.as_str())
                    .with_metadata("to", next.as_str())
                    .with_metadata("code", error.code())
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}
