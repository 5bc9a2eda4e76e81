//! JSON request layer over the selection and lifecycle engines.
//!
//! Routes:
//! - `GET    /api/catalog/{plan}`
//! - `POST   /api/drafts`, `GET|DELETE /api/drafts/{id}`
//! - `POST   /api/drafts/{id}/commands`, `POST /api/drafts/{id}/submit`
//! - `GET    /api/quotations`, `POST /api/quotations`
//! - `GET    /api/quotations/plan/{plan}`
//! - `GET|PUT|DELETE /api/quotations/{id}`

pub mod drafts;
pub mod error;
pub mod quotations;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use sitequote_core::audit::AuditSink;
use sitequote_core::{Catalog, CatalogEntry, LifecycleManager, PlanType};
use sitequote_db::QuoteStore;
use uuid::Uuid;

use self::drafts::DraftRegistry;
use self::error::ApiError;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn QuoteStore>,
    pub catalog: &'static Catalog,
    pub drafts: Arc<DraftRegistry>,
    pub lifecycle: LifecycleManager,
    pub audit: Arc<dyn AuditSink>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn QuoteStore>,
        max_drafts: usize,
        draft_ttl: Duration,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            catalog: Catalog::standard(),
            drafts: Arc::new(DraftRegistry::new(max_drafts, draft_ttl)),
            lifecycle: LifecycleManager::new(),
            audit,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/catalog/{plan}", get(catalog_entry))
        .route("/api/drafts", post(drafts::create_draft))
        .route("/api/drafts/{id}", get(drafts::get_draft).delete(drafts::discard_draft))
        .route("/api/drafts/{id}/commands", post(drafts::apply_command))
        .route("/api/drafts/{id}/submit", post(drafts::submit_draft))
        .route(
            "/api/quotations",
            get(quotations::list_quotations).post(quotations::create_quotation),
        )
        .route("/api/quotations/plan/{plan}", get(quotations::list_by_plan))
        .route(
            "/api/quotations/{id}",
            get(quotations::get_quotation)
                .put(quotations::update_quotation)
                .delete(quotations::delete_quotation),
        )
        .with_state(state)
}

/// Request id from the caller's header, or a fresh one.
pub fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

async fn catalog_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(plan): Path<String>,
) -> Result<Json<CatalogEntry>, ApiError> {
    let correlation_id = correlation_id(&headers);
    plan.parse::<PlanType>()
        .and_then(|plan| state.catalog.entry(plan).cloned())
        .map(Json)
        .map_err(|error| ApiError::from_application(error.into(), &correlation_id))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Method, Request, StatusCode},
        Router,
    };
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use sitequote_core::audit::InMemoryAuditSink;
    use sitequote_db::{connect_with_settings, InMemoryQuoteStore, QuoteStore, SqlQuoteStore};
    use tower::ServiceExt;

    use super::{router, AppState, CORRELATION_HEADER};

    fn app_with(store: Arc<dyn QuoteStore>) -> (Router, InMemoryAuditSink) {
        draft_limited_app(store, 8, Duration::from_secs(3_600))
    }

    fn draft_limited_app(
        store: Arc<dyn QuoteStore>,
        max_drafts: usize,
        draft_ttl: Duration,
    ) -> (Router, InMemoryAuditSink) {
        let audit = InMemoryAuditSink::default();
        let state = AppState::new(store, max_drafts, draft_ttl, Arc::new(audit.clone()));
        (router(state), audit)
    }

    fn app() -> (Router, InMemoryAuditSink) {
        app_with(Arc::new(InMemoryQuoteStore::new()))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .header(CORRELATION_HEADER, "test-request")
            .body(body.map(|value| Body::from(value.to_string())).unwrap_or_else(Body::empty))
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json")
        };
        (status, value)
    }

    fn decimal(value: &Value) -> Decimal {
        match value {
            Value::String(raw) => Decimal::from_str(raw).expect("decimal string"),
            other => Decimal::from_str(&other.to_string()).expect("decimal number"),
        }
    }

    fn contact() -> Value {
        json!({
            "name": "Marisol Vega",
            "email": "marisol@floreria.mx",
            "phone": "555-0177",
            "company": "Floreria Vega"
        })
    }

    #[tokio::test]
    async fn catalog_route_serves_plan_tables_and_rejects_unknown_plans() {
        let (app, _) = app();

        let (status, entry) = send(&app, Method::GET, "/api/catalog/intermediate", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&entry["basePrice"]), Decimal::from(19_000));
        assert_eq!(entry["colorLimit"], json!(4));

        let (status, error) = send(&app, Method::GET, "/api/catalog/premium", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error["code"], json!("unknown_plan"));
        assert_eq!(error["correlationId"], json!("test-request"));
    }

    #[tokio::test]
    async fn draft_flow_edits_prices_and_submits_a_pending_quotation() {
        let (app, audit) = app();

        let (status, created) =
            send(&app, Method::POST, "/api/drafts", Some(json!({ "planType": "basic" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(decimal(&created["draft"]["estimatedPrice"]), Decimal::from(12_000));
        assert_eq!(decimal(&created["evaluation"]["pricing"]["total"]), Decimal::from(12_000));
        assert_eq!(created["evaluation"]["constraints"]["valid"], json!(false));
        let draft_id = created["draft"]["draftId"].as_str().expect("draft id").to_owned();
        let commands_uri = format!("/api/drafts/{draft_id}/commands");

        let commands = [
            json!({ "op": "set_contact", "contact": contact() }),
            json!({ "op": "toggle_feature", "feature": "contact-form", "include": true }),
            json!({ "op": "toggle_feature", "feature": "optimized-images", "include": true }),
            json!({ "op": "set_deadline", "weeks": 2 }),
        ];
        let mut last = Value::Null;
        for command in commands {
            let (status, body) = send(&app, Method::POST, &commands_uri, Some(command)).await;
            assert_eq!(status, StatusCode::OK, "{body}");
            last = body;
        }
        assert_eq!(decimal(&last["outcome"]["estimatedPrice"]), Decimal::from(15_800));

        let (status, rejected) = send(
            &app,
            Method::POST,
            &commands_uri,
            Some(json!({ "op": "toggle_feature", "feature": "chat", "include": true })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(rejected["code"], json!("unknown_feature"));

        let (status, record) =
            send(&app, Method::POST, &format!("/api/drafts/{draft_id}/submit"), None).await;
        assert_eq!(status, StatusCode::CREATED, "{record}");
        assert_eq!(record["status"], json!("pending"));
        assert_eq!(record["negotiable"], json!(true));
        assert_eq!(record["finalPrice"], Value::Null);
        assert_eq!(decimal(&record["estimatedPrice"]), Decimal::from(15_800));
        assert!(record["features"]
            .as_array()
            .expect("features")
            .contains(&json!("urgent-delivery")));

        let (status, _) = send(&app, Method::GET, &format!("/api/drafts/{draft_id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let events = audit.events();
        assert_eq!(
            events.iter().filter(|event| event.event_type == "selection.command_applied").count(),
            4
        );
        assert!(events.iter().any(|event| event.event_type == "selection.command_rejected"));
    }

    #[tokio::test]
    async fn discarding_a_draft_frees_its_slot() {
        let (app, _) = draft_limited_app(
            Arc::new(InMemoryQuoteStore::new()),
            2,
            Duration::from_secs(3_600),
        );
        let new_draft = || json!({ "planType": "basic" });

        let (_, first) = send(&app, Method::POST, "/api/drafts", Some(new_draft())).await;
        let (status, _) = send(&app, Method::POST, "/api/drafts", Some(new_draft())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, error) = send(&app, Method::POST, "/api/drafts", Some(new_draft())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(error["code"], json!("service_unavailable"));

        let uri = format!("/api/drafts/{}", first["draft"]["draftId"].as_str().expect("id"));
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, error) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["code"], json!("not_found"));

        let (status, _) = send(&app, Method::POST, "/api/drafts", Some(new_draft())).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn abandoned_drafts_expire_so_creation_recovers() {
        let (app, _) = draft_limited_app(
            Arc::new(InMemoryQuoteStore::new()),
            2,
            Duration::from_millis(100),
        );
        let new_draft = || json!({ "planType": "intermediate" });

        let (_, abandoned) = send(&app, Method::POST, "/api/drafts", Some(new_draft())).await;
        send(&app, Method::POST, "/api/drafts", Some(new_draft())).await;
        let (status, _) = send(&app, Method::POST, "/api/drafts", Some(new_draft())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        tokio::time::sleep(Duration::from_millis(250)).await;

        let (status, _) = send(&app, Method::POST, "/api/drafts", Some(new_draft())).await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/api/drafts/{}", abandoned["draft"]["draftId"].as_str().expect("id"));
        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn direct_submission_ignores_client_status_and_recomputes_price() {
        let (app, _) = app();

        let (status, record) = send(
            &app,
            Method::POST,
            "/api/quotations",
            Some(json!({
                "planType": "advanced",
                "contact": contact(),
                "animations": ["3d"],
                "features": ["custom-dashboard"],
                "status": "approved",
                "finalPrice": 1
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED, "{record}");
        assert_eq!(record["status"], json!("pending"));
        assert_eq!(record["finalPrice"], Value::Null);
        assert_eq!(decimal(&record["estimatedPrice"]), Decimal::from(38_500));
    }

    #[tokio::test]
    async fn direct_submission_surfaces_validation_failures() {
        let (app, _) = app();

        let (status, error) = send(
            &app,
            Method::POST,
            "/api/quotations",
            Some(json!({
                "planType": "advanced",
                "contact": { "name": "Sin Empresa", "email": "x@y.mx", "phone": "555" }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error["code"], json!("validation"));

        let (status, error) =
            send(&app, Method::POST, "/api/quotations", Some(json!({ "planType": 7 }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error["code"], json!("malformed_request"));

        let (status, error) = send(
            &app,
            Method::POST,
            "/api/quotations",
            Some(json!({ "planType": "basic", "contact": contact(), "pages": ["home", "xyz"] })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error["code"], json!("unknown_page"));
    }

    #[tokio::test]
    async fn lifecycle_updates_follow_the_state_machine() {
        let (app, audit) = app();
        let (_, record) = send(
            &app,
            Method::POST,
            "/api/quotations",
            Some(json!({ "planType": "basic", "contact": contact() })),
        )
        .await;
        let uri = format!("/api/quotations/{}", record["id"].as_str().expect("id"));

        let (status, error) = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({ "status": "contacted", "finalPrice": 11000 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error["code"], json!("invalid_field_state"));

        let (status, negotiating) = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({
                "status": "negotiating",
                "finalPrice": "11000",
                "negotiationNotes": "Client asked for a launch discount"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{negotiating}");
        assert_eq!(negotiating["status"], json!("negotiating"));
        assert_eq!(decimal(&negotiating["finalPrice"]), Decimal::from(11_000));

        let (status, approved) =
            send(&app, Method::PUT, &uri, Some(json!({ "status": "approved" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approved["status"], json!("approved"));
        assert_eq!(approved["negotiationNotes"], json!("Client asked for a launch discount"));

        let (status, error) =
            send(&app, Method::PUT, &uri, Some(json!({ "negotiable": false }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error["code"], json!("terminal_state"));

        let (status, error) =
            send(&app, Method::PUT, &uri, Some(json!({ "status": "archived" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error["code"], json!("invalid_status"));

        let rejected = audit
            .events()
            .into_iter()
            .filter(|event| event.event_type == "lifecycle.transition_rejected")
            .count();
        assert_eq!(rejected, 2);
    }

    #[tokio::test]
    async fn listing_filters_by_plan_and_delete_reports_missing_records() {
        let (app, _) = app();
        for plan in ["basic", "intermediate", "basic"] {
            let (status, _) = send(
                &app,
                Method::POST,
                "/api/quotations",
                Some(json!({ "planType": plan, "contact": contact() })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, all) = send(&app, Method::GET, "/api/quotations", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all.as_array().expect("list").len(), 3);

        let (_, basic) = send(&app, Method::GET, "/api/quotations/plan/basic", None).await;
        let basic = basic.as_array().expect("list").clone();
        assert_eq!(basic.len(), 2);

        let (status, error) =
            send(&app, Method::GET, "/api/quotations?order=sideways", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error["code"], json!("invalid_order"));

        let uri = format!("/api/quotations/{}", basic[0]["id"].as_str().expect("id"));
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, error) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["code"], json!("not_found"));
        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn store_outage_is_reported_as_retryable_unavailability() {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 1).await.expect("pool should connect");
        pool.close().await;
        let (app, _) = app_with(Arc::new(SqlQuoteStore::new(pool)));

        let (status, error) = send(&app, Method::GET, "/api/quotations", None).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(error["code"], json!("service_unavailable"));
        assert_eq!(error["retryable"], json!(true));
    }
}
