pub mod audit;
pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;
pub mod lifecycle;

pub use audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink,
};
pub use cpq::catalog::{Catalog, CatalogEntry, DeadlineOption, PageLimit};
pub use cpq::constraints::{ConstraintResult, ConstraintViolation};
pub use cpq::pricing::{compute_price, PricingResult};
pub use cpq::selection::{SelectionCommand, SelectionManager, SelectionOutcome};
pub use domain::plan::PlanType;
pub use domain::quote::{
    NewQuotation, QuoteId, QuoteSnapshot, QuoteStatus, Quotation, QuotationPatch,
};
pub use domain::selection::{
    BrandingReadiness, ContactDetails, DesignStyle, DraftId, SelectionState, URGENT_DELIVERY,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use lifecycle::{LifecycleManager, NegotiationFields, TransitionOutcome};
