//! In-progress drafts and the commands that edit them.
//!
//! Drafts live only in process memory; a successful submit persists the
//! quotation and forgets the draft. Drafts idle for longer than the
//! configured ttl are evicted.

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sitequote_core::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome};
use sitequote_core::cpq::{CpqRuntime, DeterministicCpqRuntime, SelectionEvaluation};
use sitequote_core::errors::ApplicationError;
use sitequote_core::{
    DraftId, PlanType, Quotation, SelectionCommand, SelectionManager, SelectionOutcome,
    SelectionState,
};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::api::{correlation_id, error::ApiError, AppState};

struct DraftEntry {
    draft: SelectionState,
    last_touched: Instant,
}

impl DraftEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.last_touched) > ttl
    }
}

pub struct DraftRegistry {
    drafts: RwLock<HashMap<DraftId, DraftEntry>>,
    capacity: usize,
    ttl: Duration,
}

impl DraftRegistry {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self { drafts: RwLock::new(HashMap::new()), capacity, ttl }
    }

    /// Evicts expired drafts first, then returns `false` without storing when
    /// the registry is still full.
    pub async fn insert(&self, draft: SelectionState) -> bool {
        let mut drafts = self.drafts.write().await;
        let now = Instant::now();

        let before = drafts.len();
        drafts.retain(|_, entry| !entry.is_expired(now, self.ttl));
        let evicted = before - drafts.len();
        if evicted > 0 {
            debug!(event_name = "api.draft.expired", evicted, "evicted idle drafts");
        }

        if drafts.len() >= self.capacity && !drafts.contains_key(&draft.draft_id) {
            return false;
        }
        drafts.insert(draft.draft_id.clone(), DraftEntry { draft, last_touched: now });
        true
    }

    pub async fn get(&self, id: &DraftId) -> Option<SelectionState> {
        self.edit(id, |draft| draft.clone()).await
    }

    /// Runs `edit` against the stored draft under the write lock and marks it
    /// as recently used. An expired draft is dropped and reported missing.
    pub async fn edit<T>(
        &self,
        id: &DraftId,
        edit: impl FnOnce(&mut SelectionState) -> T,
    ) -> Option<T> {
        let mut drafts = self.drafts.write().await;
        let now = Instant::now();
        if drafts.get(id).is_some_and(|entry| entry.is_expired(now, self.ttl)) {
            drafts.remove(id);
            return None;
        }

        let entry = drafts.get_mut(id)?;
        entry.last_touched = now;
        Some(edit(&mut entry.draft))
    }

    pub async fn remove(&self, id: &DraftId) -> Option<SelectionState> {
        self.drafts.write().await.remove(id).map(|entry| entry.draft)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDraftRequest {
    pub plan_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub draft: SelectionState,
    /// Outstanding violations and the price breakdown, as a submit would see them.
    pub evaluation: SelectionEvaluation,
}

impl DraftView {
    fn evaluate(
        state: &AppState,
        draft: SelectionState,
        correlation_id: &str,
    ) -> Result<Self, ApiError> {
        let entry = state
            .catalog
            .entry(draft.plan)
            .map_err(|error| ApiError::from_application(error.into(), correlation_id))?;
        let evaluation = DeterministicCpqRuntime::default().evaluate_selection(entry, &draft);
        Ok(Self { draft, evaluation })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub outcome: SelectionOutcome,
    pub draft: SelectionState,
}

pub async fn create_draft(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<NewDraftRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DraftView>), ApiError> {
    let correlation_id = correlation_id(&headers);
    let Json(request) =
        body.map_err(|rejection| ApiError::malformed_body(rejection, &correlation_id))?;

    let plan = request.plan_type.parse::<PlanType>().map_err(|error| {
        ApiError::from_application(ApplicationError::from(error), &correlation_id)
    })?;
    let draft = SelectionManager::new(state.catalog)
        .new_draft(plan)
        .map_err(|error| ApiError::from_application(error.into(), &correlation_id))?;

    if !state.drafts.insert(draft.clone()).await {
        return Err(ApiError::unavailable("draft capacity reached", &correlation_id));
    }

    info!(
        event_name = "api.draft.created",
        correlation_id = %correlation_id,
        draft_id = %draft.draft_id.0,
        plan = %plan,
        "draft created"
    );
    Ok((StatusCode::CREATED, Json(DraftView::evaluate(&state, draft, &correlation_id)?)))
}

pub async fn get_draft(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DraftView>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let draft = state
        .drafts
        .get(&DraftId(id.clone()))
        .await
        .ok_or_else(|| ApiError::not_found("draft", &id, &correlation_id))?;
    Ok(Json(DraftView::evaluate(&state, draft, &correlation_id)?))
}

pub async fn apply_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<SelectionCommand>, JsonRejection>,
) -> Result<Json<CommandResponse>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let Json(command) =
        body.map_err(|rejection| ApiError::malformed_body(rejection, &correlation_id))?;
    let op = command.name();

    let manager = SelectionManager::new(state.catalog);
    let result = state
        .drafts
        .edit(&DraftId(id.clone()), |draft| {
            manager.apply(draft, command).map(|outcome| (outcome, draft.clone()))
        })
        .await
        .ok_or_else(|| ApiError::not_found("draft", &id, &correlation_id))?;

    let context = AuditContext::new(None, correlation_id.clone(), "selection-manager");
    match result {
        Ok((outcome, draft)) => {
            state.audit.emit(
                AuditEvent::new(
                    &context,
                    "selection.command_applied",
                    AuditCategory::Selection,
                    AuditOutcome::Success,
                )
                .with_metadata("draft_id", id.as_str())
                .with_metadata("op", op)
                .with_metadata("applied", outcome.applied.to_string())
                .with_metadata("estimated_price", outcome.estimated_price.to_string()),
            );
            Ok(Json(CommandResponse { outcome, draft }))
        }
        Err(error) => {
            state.audit.emit(
                AuditEvent::new(
                    &context,
                    "selection.command_rejected",
                    AuditCategory::Selection,
                    AuditOutcome::Rejected,
                )
                .with_metadata("draft_id", id.as_str())
                .with_metadata("op", op)
                .with_metadata("code", error.code()),
            );
            Err(ApiError::from_application(error.into(), &correlation_id))
        }
    }
}

pub async fn discard_draft(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let correlation_id = correlation_id(&headers);
    state
        .drafts
        .remove(&DraftId(id.clone()))
        .await
        .ok_or_else(|| ApiError::not_found("draft", &id, &correlation_id))?;

    info!(
        event_name = "api.draft.discarded",
        correlation_id = %correlation_id,
        draft_id = %id,
        "draft discarded"
    );
    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit_draft(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Quotation>), ApiError> {
    let correlation_id = correlation_id(&headers);
    let draft_id = DraftId(id.clone());
    let draft = state
        .drafts
        .get(&draft_id)
        .await
        .ok_or_else(|| ApiError::not_found("draft", &id, &correlation_id))?;

    let submission = SelectionManager::new(state.catalog)
        .submit(draft, Utc::now())
        .map_err(|error| ApiError::from_application(error.into(), &correlation_id))?;
    let record = state
        .store
        .create(submission)
        .await
        .map_err(|error| ApiError::persistence(error, &correlation_id))?;
    state.drafts.remove(&draft_id).await;

    info!(
        event_name = "api.draft.submitted",
        correlation_id = %correlation_id,
        draft_id = %id,
        quote_id = %record.id,
        estimated_price = %record.snapshot.estimated_price,
        "draft submitted as quotation"
    );
    Ok((StatusCode::CREATED, Json(record)))
}
