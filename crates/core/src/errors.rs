use thiserror::Error;

use crate::cpq::constraints::ConstraintViolation;
use crate::domain::plan::PlanType;
use crate::domain::quote::QuoteStatus;
use crate::domain::selection::DesignStyle;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown plan type `{plan}` (expected basic|intermediate|advanced)")]
    UnknownPlan { plan: String },
    #[error("page `{page}` is always included and cannot be toggled")]
    ImmutablePage { page: String },
    #[error("page `{page}` is not offered on the {plan} plan")]
    UnknownPage { page: String, plan: PlanType },
    #[error("feature `{feature}` is not offered on the {plan} plan")]
    UnknownFeature { feature: String, plan: PlanType },
    #[error("{weeks}-week delivery is not offered on the {plan} plan")]
    InvalidDeadline { weeks: u8, plan: PlanType },
    #[error("design style `{design}` is not offered on the {plan} plan")]
    UnsupportedDesign { design: DesignStyle, plan: PlanType },
    #[error("{operation} is not available on the {plan} plan")]
    UnsupportedOperation { operation: String, plan: PlanType },
    #[error("quotation is {status} and accepts no further changes")]
    TerminalState { status: QuoteStatus },
    #[error("{field} can only be set while negotiating, approved or rejected (target status: {status})")]
    InvalidFieldState { field: String, status: QuoteStatus },
    #[error("validation failed: {}", summarize(.violations))]
    Validation { violations: Vec<ConstraintViolation> },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    /// Stable machine-readable code for request-layer responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownPlan { .. } => "unknown_plan",
            Self::ImmutablePage { .. } => "immutable_page",
            Self::UnknownPage { .. } => "unknown_page",
            Self::UnknownFeature { .. } => "unknown_feature",
            Self::InvalidDeadline { .. } => "invalid_deadline",
            Self::UnsupportedDesign { .. } => "unsupported_design",
            Self::UnsupportedOperation { .. } => "unsupported_operation",
            Self::TerminalState { .. } => "terminal_state",
            Self::InvalidFieldState { .. } => "invalid_field_state",
            Self::Validation { .. } => "validation",
            Self::InvariantViolation(_) => "invariant_violation",
        }
    }
}

fn summarize(violations: &[ConstraintViolation]) -> String {
    violations.iter().map(|violation| violation.message.as_str()).collect::<Vec<_>>().join("; ")
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{entity} `{id}` was not found")]
    NotFound { entity: &'static str, id: String },
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("request rejected ({code}): {message}")]
    BadRequest { code: String, message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::NotFound { .. } => "The requested quotation does not exist.",
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    /// Infrastructure failures may succeed on retry; rejected input never will.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable { .. })
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(DomainError::InvariantViolation(message)) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Domain(error) => Self::BadRequest {
                code: error.code().to_owned(),
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            error @ ApplicationError::NotFound { .. } => {
                Self::NotFound { message: error.to_string(), correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Persistence(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
