use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use sitequote_core::audit::AuditContext;
use sitequote_core::{
    BrandingReadiness, ContactDetails, DesignStyle, NegotiationFields, PlanType, QuoteId,
    QuoteStatus, Quotation, SelectionManager,
};
use sitequote_db::SubmissionOrder;
use tracing::{info, warn};

use crate::api::{correlation_id, error::ApiError, AppState};

/// A complete selection posted in one request.
///
/// Lifecycle fields are never taken from the client; a `status` other than
/// `pending` is logged and dropped.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuotationRequest {
    pub plan_type: String,
    pub contact: ContactDetails,
    #[serde(default)]
    pub pages: Vec<String>,
    pub design: Option<DesignStyle>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub animations: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub deadline_weeks: Option<u8>,
    pub notes: Option<String>,
    pub competitors: Option<String>,
    pub branding: Option<BrandingReadiness>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleUpdateRequest {
    pub status: Option<String>,
    pub final_price: Option<Decimal>,
    pub negotiation_notes: Option<String>,
    pub negotiable: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub order: Option<String>,
}

pub async fn create_quotation(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SubmitQuotationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Quotation>), ApiError> {
    let correlation_id = correlation_id(&headers);
    let Json(request) =
        body.map_err(|rejection| ApiError::malformed_body(rejection, &correlation_id))?;
    let reject = |error: sitequote_core::DomainError| {
        ApiError::from_application(error.into(), &correlation_id)
    };

    if let Some(status) = request.status.as_deref().filter(|status| *status != "pending") {
        warn!(
            event_name = "api.quotation.client_status_ignored",
            correlation_id = %correlation_id,
            requested_status = %status,
            "client-supplied status ignored; new quotations start pending"
        );
    }

    let plan = request.plan_type.parse::<PlanType>().map_err(reject)?;
    let manager = SelectionManager::new(state.catalog);
    let mut selection = manager.new_draft(plan).map_err(reject)?;

    manager.set_contact(&mut selection, request.contact).map_err(reject)?;
    if !request.pages.is_empty() {
        selection.pages = request.pages.into_iter().collect();
    }
    if let Some(design) = request.design {
        manager.set_design(&mut selection, design).map_err(reject)?;
    }
    selection.colors = request.colors;
    selection.animations = request.animations;
    selection.features = request.features.into_iter().collect();
    if let Some(weeks) = request.deadline_weeks {
        selection.deadline_weeks = weeks;
    }
    if request.notes.is_some() {
        manager.set_notes(&mut selection, request.notes).map_err(reject)?;
    }
    if request.competitors.is_some() {
        manager.set_competitors(&mut selection, request.competitors).map_err(reject)?;
    }
    if request.branding.is_some() {
        manager.set_branding(&mut selection, request.branding).map_err(reject)?;
    }

    let submission = manager.submit(selection, Utc::now()).map_err(reject)?;
    let record = state
        .store
        .create(submission)
        .await
        .map_err(|error| ApiError::persistence(error, &correlation_id))?;

    info!(
        event_name = "api.quotation.created",
        correlation_id = %correlation_id,
        quote_id = %record.id,
        plan = %record.snapshot.plan,
        estimated_price = %record.snapshot.estimated_price,
        "quotation submitted"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_quotations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Quotation>>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let order = match query.order.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("newest") | Some("desc") => SubmissionOrder::NewestFirst,
        Some("oldest") | Some("asc") => SubmissionOrder::OldestFirst,
        Some(other) => {
            return Err(ApiError::bad_request(
                "invalid_order",
                format!("unknown order `{other}` (expected newest|oldest)"),
                &correlation_id,
            ));
        }
    };

    let records = state
        .store
        .list_all(order)
        .await
        .map_err(|error| ApiError::persistence(error, &correlation_id))?;
    Ok(Json(records))
}

pub async fn list_by_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(plan): Path<String>,
) -> Result<Json<Vec<Quotation>>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let plan = plan
        .parse::<PlanType>()
        .map_err(|error| ApiError::from_application(error.into(), &correlation_id))?;

    let records = state
        .store
        .list_by_plan(plan)
        .await
        .map_err(|error| ApiError::persistence(error, &correlation_id))?;
    Ok(Json(records))
}

pub async fn get_quotation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Quotation>, ApiError> {
    let correlation_id = correlation_id(&headers);
    state
        .store
        .get_by_id(&QuoteId(id.clone()))
        .await
        .map_err(|error| ApiError::persistence(error, &correlation_id))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("quotation", &id, &correlation_id))
}

/// Moves a quotation through its lifecycle and records negotiation outcomes.
///
/// Omitting `status` amends the negotiation fields in place.
pub async fn update_quotation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<LifecycleUpdateRequest>, JsonRejection>,
) -> Result<Json<Quotation>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let Json(request) =
        body.map_err(|rejection| ApiError::malformed_body(rejection, &correlation_id))?;
    let quote_id = QuoteId(id.clone());

    let mut record = state
        .store
        .get_by_id(&quote_id)
        .await
        .map_err(|error| ApiError::persistence(error, &correlation_id))?
        .ok_or_else(|| ApiError::not_found("quotation", &id, &correlation_id))?;

    let next = match request.status.as_deref() {
        Some(raw) => raw
            .parse::<QuoteStatus>()
            .map_err(|message| ApiError::bad_request("invalid_status", message, &correlation_id))?,
        None => record.status,
    };
    let fields = NegotiationFields {
        final_price: request.final_price,
        negotiation_notes: request.negotiation_notes,
        negotiable: request.negotiable,
    };

    let audit = AuditContext::new(Some(quote_id.clone()), correlation_id.clone(), "api");
    let outcome = state
        .lifecycle
        .advance_with_audit(&mut record, next, &fields, state.audit.as_ref(), &audit)
        .map_err(|error| ApiError::from_application(error.into(), &correlation_id))?;

    if outcome.patch.is_empty() {
        return Ok(Json(record));
    }

    let updated = state
        .store
        .update(&quote_id, outcome.patch)
        .await
        .map_err(|error| ApiError::persistence(error, &correlation_id))?
        .ok_or_else(|| ApiError::not_found("quotation", &id, &correlation_id))?;

    info!(
        event_name = "api.quotation.updated",
        correlation_id = %correlation_id,
        quote_id = %updated.id,
        from = %outcome.from,
        to = %outcome.to,
        "quotation lifecycle updated"
    );
    Ok(Json(updated))
}

pub async fn delete_quotation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let correlation_id = correlation_id(&headers);
    let deleted = state
        .store
        .delete(&QuoteId(id.clone()))
        .await
        .map_err(|error| ApiError::persistence(error, &correlation_id))?;

    if !deleted {
        return Err(ApiError::not_found("quotation", &id, &correlation_id));
    }
    info!(
        event_name = "api.quotation.deleted",
        correlation_id = %correlation_id,
        quote_id = %id,
        "quotation deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
