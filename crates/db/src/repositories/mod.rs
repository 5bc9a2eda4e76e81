use async_trait::async_trait;
use thiserror::Error;

use sitequote_core::domain::plan::PlanType;
use sitequote_core::domain::quote::{NewQuotation, QuoteId, Quotation, QuotationPatch};

pub mod memory;
pub mod quote;

pub use memory::InMemoryQuoteStore;
pub use quote::SqlQuoteStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmissionOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Persistence for submitted quotations.
///
/// Each call is one atomic request/response unit. Callers serialize writes to
/// the same identifier.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Stores a new record under a freshly generated identifier.
    async fn create(&self, quotation: NewQuotation) -> Result<Quotation, RepositoryError>;

    async fn get_by_id(&self, id: &QuoteId) -> Result<Option<Quotation>, RepositoryError>;

    async fn list_all(&self, order: SubmissionOrder) -> Result<Vec<Quotation>, RepositoryError>;

    /// Records of one plan, newest submission first.
    async fn list_by_plan(&self, plan: PlanType) -> Result<Vec<Quotation>, RepositoryError>;

    /// Applies the set fields of `patch`; `None` when nothing has that identifier.
    async fn update(
        &self,
        id: &QuoteId,
        patch: QuotationPatch,
    ) -> Result<Option<Quotation>, RepositoryError>;

    async fn delete(&self, id: &QuoteId) -> Result<bool, RepositoryError>;

    /// Cheap liveness probe used by health checks.
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
