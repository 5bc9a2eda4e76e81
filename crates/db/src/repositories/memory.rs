use std::cmp::Reverse;
use std::collections::HashMap;

use tokio::sync::RwLock;

use sitequote_core::domain::plan::PlanType;
use sitequote_core::domain::quote::{NewQuotation, QuoteId, Quotation, QuotationPatch};

use super::{QuoteStore, RepositoryError, SubmissionOrder};

#[derive(Default)]
pub struct InMemoryQuoteStore {
    quotations: RwLock<HashMap<String, Quotation>>,
}

impl InMemoryQuoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_by_submission(records: &mut [Quotation], order: SubmissionOrder) {
    match order {
        SubmissionOrder::NewestFirst => {
            records.sort_by_key(|record| {
                (Reverse(record.submission_date), Reverse(record.id.0.clone()))
            })
        }
        SubmissionOrder::OldestFirst => {
            records.sort_by_key(|record| (record.submission_date, record.id.0.clone()))
        }
    }
}

#[async_trait::async_trait]
impl QuoteStore for InMemoryQuoteStore {
    async fn create(&self, quotation: NewQuotation) -> Result<Quotation, RepositoryError> {
        let record = quotation.into_quotation(QuoteId::generate());
        let mut quotations = self.quotations.write().await;
        quotations.insert(record.id.0.clone(), record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: &QuoteId) -> Result<Option<Quotation>, RepositoryError> {
        let quotations = self.quotations.read().await;
        Ok(quotations.get(&id.0).cloned())
    }

    async fn list_all(&self, order: SubmissionOrder) -> Result<Vec<Quotation>, RepositoryError> {
        let quotations = self.quotations.read().await;
        let mut records: Vec<_> = quotations.values().cloned().collect();
        sort_by_submission(&mut records, order);
        Ok(records)
    }

    async fn list_by_plan(&self, plan: PlanType) -> Result<Vec<Quotation>, RepositoryError> {
        let quotations = self.quotations.read().await;
        let mut records: Vec<_> =
            quotations.values().filter(|record| record.snapshot.plan == plan).cloned().collect();
        sort_by_submission(&mut records, SubmissionOrder::NewestFirst);
        Ok(records)
    }

    async fn update(
        &self,
        id: &QuoteId,
        patch: QuotationPatch,
    ) -> Result<Option<Quotation>, RepositoryError> {
        let mut quotations = self.quotations.write().await;
        Ok(quotations.get_mut(&id.0).map(|record| {
            record.apply_patch(&patch);
            record.clone()
        }))
    }

    async fn delete(&self, id: &QuoteId) -> Result<bool, RepositoryError> {
        let mut quotations = self.quotations.write().await;
        Ok(quotations.remove(&id.0).is_some())
    }
}
