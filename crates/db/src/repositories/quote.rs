use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use sitequote_core::domain::plan::PlanType;
use sitequote_core::domain::quote::{
    NewQuotation, QuoteId, QuoteSnapshot, QuoteStatus, Quotation, QuotationPatch,
};
use sitequote_core::domain::selection::{BrandingReadiness, ContactDetails, DesignStyle};

use super::{QuoteStore, RepositoryError, SubmissionOrder};
use crate::DbPool;

const SELECT_COLUMNS: &str = "SELECT id, plan_type, contact_name, contact_email, contact_phone,
        contact_company, contact_position, pages_json, design, colors_json, animations_json,
        features_json, deadline_weeks, notes, competitors, branding, estimated_price,
        submission_date, status, negotiation_notes, final_price, negotiable
     FROM quotation";

pub struct SqlQuoteStore {
    pool: DbPool,
}

impl SqlQuoteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Fixed-width UTC timestamps so that text ordering matches time ordering.
fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_err(error: impl ToString) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

fn encode_list(values: &[String]) -> Result<String, RepositoryError> {
    serde_json::to_string(values).map_err(decode_err)
}

fn decode_list(column: &str, raw: &str) -> Result<Vec<String>, RepositoryError> {
    serde_json::from_str(raw).map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn decode_decimal(column: &str, raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw).map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn row_to_quotation(row: &sqlx::sqlite::SqliteRow) -> Result<Quotation, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let plan_str: String = row.try_get("plan_type").map_err(decode_err)?;
    let design_str: String = row.try_get("design").map_err(decode_err)?;
    let branding_str: Option<String> = row.try_get("branding").map_err(decode_err)?;
    let deadline_weeks: i64 = row.try_get("deadline_weeks").map_err(decode_err)?;
    let estimated_price_str: String = row.try_get("estimated_price").map_err(decode_err)?;
    let submission_date_str: String = row.try_get("submission_date").map_err(decode_err)?;
    let status_str: String = row.try_get("status").map_err(decode_err)?;
    let final_price_str: Option<String> = row.try_get("final_price").map_err(decode_err)?;
    let negotiable: bool = row.try_get("negotiable").map_err(decode_err)?;

    let plan = PlanType::from_str(&plan_str).map_err(decode_err)?;
    let design = DesignStyle::from_str(&design_str).map_err(RepositoryError::Decode)?;
    let branding = branding_str
        .map(|value| BrandingReadiness::from_str(&value))
        .transpose()
        .map_err(RepositoryError::Decode)?;
    let status = QuoteStatus::from_str(&status_str).map_err(RepositoryError::Decode)?;
    let submission_date = DateTime::parse_from_rfc3339(&submission_date_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("submission_date: {e}")))?;
    let final_price = final_price_str
        .map(|value| decode_decimal("final_price", &value))
        .transpose()?;
    let deadline_weeks = u8::try_from(deadline_weeks)
        .map_err(|e| RepositoryError::Decode(format!("deadline_weeks: {e}")))?;

    Ok(Quotation {
        id: QuoteId(id),
        snapshot: QuoteSnapshot {
            plan,
            contact: ContactDetails {
                name: row.try_get("contact_name").map_err(decode_err)?,
                email: row.try_get("contact_email").map_err(decode_err)?,
                phone: row.try_get("contact_phone").map_err(decode_err)?,
                company: row.try_get("contact_company").map_err(decode_err)?,
                position: row.try_get("contact_position").map_err(decode_err)?,
            },
            pages: decode_list(
                "pages_json",
                &row.try_get::<String, _>("pages_json").map_err(decode_err)?,
            )?,
            design,
            colors: decode_list(
                "colors_json",
                &row.try_get::<String, _>("colors_json").map_err(decode_err)?,
            )?,
            animations: decode_list(
                "animations_json",
                &row.try_get::<String, _>("animations_json").map_err(decode_err)?,
            )?,
            features: decode_list(
                "features_json",
                &row.try_get::<String, _>("features_json").map_err(decode_err)?,
            )?,
            deadline_weeks,
            notes: row.try_get("notes").map_err(decode_err)?,
            competitors: row.try_get("competitors").map_err(decode_err)?,
            branding,
            estimated_price: decode_decimal("estimated_price", &estimated_price_str)?,
        },
        submission_date,
        status,
        negotiation_notes: row.try_get("negotiation_notes").map_err(decode_err)?,
        final_price,
        negotiable,
    })
}

#[async_trait::async_trait]
impl QuoteStore for SqlQuoteStore {
    async fn create(&self, quotation: NewQuotation) -> Result<Quotation, RepositoryError> {
        let mut record = quotation.into_quotation(QuoteId::generate());
        // stored with microsecond precision
        record.submission_date = record.submission_date.trunc_subsecs(6);
        let snapshot = &record.snapshot;

        sqlx::query(
            "INSERT INTO quotation (id, plan_type, contact_name, contact_email, contact_phone,
                                    contact_company, contact_position, pages_json, design,
                                    colors_json, animations_json, features_json, deadline_weeks,
                                    notes, competitors, branding, estimated_price,
                                    submission_date, status, negotiation_notes, final_price,
                                    negotiable)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id.0)
        .bind(snapshot.plan.as_str())
        .bind(&snapshot.contact.name)
        .bind(&snapshot.contact.email)
        .bind(&snapshot.contact.phone)
        .bind(&snapshot.contact.company)
        .bind(&snapshot.contact.position)
        .bind(encode_list(&snapshot.pages)?)
        .bind(snapshot.design.as_str())
        .bind(encode_list(&snapshot.colors)?)
        .bind(encode_list(&snapshot.animations)?)
        .bind(encode_list(&snapshot.features)?)
        .bind(i64::from(snapshot.deadline_weeks))
        .bind(&snapshot.notes)
        .bind(&snapshot.competitors)
        .bind(snapshot.branding.map(|branding| branding.as_str()))
        .bind(snapshot.estimated_price.to_string())
        .bind(timestamp(&record.submission_date))
        .bind(record.status.as_str())
        .bind(&record.negotiation_notes)
        .bind(record.final_price.map(|price| price.to_string()))
        .bind(record.negotiable)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get_by_id(&self, id: &QuoteId) -> Result<Option<Quotation>, RepositoryError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
        let row = sqlx::query(&sql).bind(&id.0).fetch_optional(&self.pool).await?;

        match row {
            Some(ref r) => Ok(Some(row_to_quotation(r)?)),
            None => Ok(None),
        }
    }

    async fn list_all(&self, order: SubmissionOrder) -> Result<Vec<Quotation>, RepositoryError> {
        let direction = match order {
            SubmissionOrder::NewestFirst => "DESC",
            SubmissionOrder::OldestFirst => "ASC",
        };
        let sql = format!("{SELECT_COLUMNS} ORDER BY submission_date {direction}, id {direction}");
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(row_to_quotation).collect::<Result<Vec<_>, _>>()
    }

    async fn list_by_plan(&self, plan: PlanType) -> Result<Vec<Quotation>, RepositoryError> {
        let sql =
            format!("{SELECT_COLUMNS} WHERE plan_type = ? ORDER BY submission_date DESC, id DESC");
        let rows: Vec<sqlx::sqlite::SqliteRow> =
            sqlx::query(&sql).bind(plan.as_str()).fetch_all(&self.pool).await?;

        rows.iter().map(row_to_quotation).collect::<Result<Vec<_>, _>>()
    }

    async fn update(
        &self,
        id: &QuoteId,
        patch: QuotationPatch,
    ) -> Result<Option<Quotation>, RepositoryError> {
        let result = sqlx::query(
            "UPDATE quotation SET
                 status = COALESCE(?, status),
                 negotiation_notes = COALESCE(?, negotiation_notes),
                 final_price = COALESCE(?, final_price),
                 negotiable = COALESCE(?, negotiable)
             WHERE id = ?",
        )
        .bind(patch.status.map(|status| status.as_str()))
        .bind(&patch.negotiation_notes)
        .bind(patch.final_price.map(|price| price.to_string()))
        .bind(patch.negotiable)
        .bind(&id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: &QuoteId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM quotation WHERE id = ?").bind(&id.0).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use sqlx::Row;

    use sitequote_core::domain::plan::PlanType;
    use sitequote_core::domain::quote::{
        NewQuotation, QuoteId, QuoteSnapshot, QuoteStatus, QuotationPatch,
    };
    use sitequote_core::domain::selection::{BrandingReadiness, ContactDetails, DesignStyle};

    use super::SqlQuoteStore;
    use crate::repositories::{QuoteStore, SubmissionOrder};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup() -> (DbPool, SqlQuoteStore) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        (pool.clone(), SqlQuoteStore::new(pool))
    }

    fn advanced_submission(minutes: i64) -> NewQuotation {
        let base = Utc.with_ymd_and_hms(2026, 5, 4, 16, 30, 0).single().expect("valid date");
        NewQuotation {
            snapshot: QuoteSnapshot {
                plan: PlanType::Advanced,
                contact: ContactDetails {
                    name: "Jorge Lima".to_string(),
                    email: "jorge@limahoteles.mx".to_string(),
                    phone: "555-0177".to_string(),
                    company: Some("Lima Hoteles".to_string()),
                    position: Some("Director".to_string()),
                },
                pages: vec!["home".to_string(), "booking".to_string()],
                design: DesignStyle::Custom,
                colors: vec!["gold".to_string(), "black".to_string()],
                animations: vec!["3d".to_string()],
                features: vec!["custom-dashboard".to_string(), "urgent-delivery".to_string()],
                deadline_weeks: 2,
                notes: Some("Needs a bilingual site".to_string()),
                competitors: Some("https://rival.example".to_string()),
                branding: Some(BrandingReadiness::Partial),
                estimated_price: Decimal::from(43_500),
            },
            submission_date: base + Duration::minutes(minutes),
        }
    }

    #[tokio::test]
    async fn sql_store_round_trip_preserves_snapshot() {
        let (_pool, store) = setup().await;
        let created = store.create(advanced_submission(0)).await.expect("create");

        let found = store.get_by_id(&created.id).await.expect("get").expect("stored");
        assert_eq!(found, created);
        assert_eq!(found.status, QuoteStatus::Pending);
        assert!(found.negotiable);
        assert_eq!(found.final_price, None);
    }

    #[tokio::test]
    async fn sql_store_orders_by_submission_date() {
        let (_pool, store) = setup().await;
        let early = store.create(advanced_submission(0)).await.expect("early");
        let late = store.create(advanced_submission(90)).await.expect("late");

        let newest = store.list_all(SubmissionOrder::NewestFirst).await.expect("list");
        let newest_ids: Vec<_> = newest.iter().map(|record| record.id.clone()).collect();
        assert_eq!(newest_ids, vec![late.id.clone(), early.id.clone()]);
        let oldest = store.list_all(SubmissionOrder::OldestFirst).await.expect("list");
        assert_eq!(oldest[0].id, early.id);

        assert_eq!(store.list_by_plan(PlanType::Advanced).await.expect("advanced").len(), 2);
        assert!(store.list_by_plan(PlanType::Basic).await.expect("basic").is_empty());
    }

    #[tokio::test]
    async fn sql_store_update_keeps_unset_fields() {
        let (pool, store) = setup().await;
        let created = store.create(advanced_submission(0)).await.expect("create");

        store
            .update(
                &created.id,
                QuotationPatch {
                    status: Some(QuoteStatus::Negotiating),
                    negotiation_notes: Some("asked for a payment plan".to_string()),
                    final_price: Some(Decimal::new(4_100_050, 2)),
                    negotiable: None,
                },
            )
            .await
            .expect("update")
            .expect("record exists");
        let updated = store
            .update(&created.id, QuotationPatch { negotiable: Some(false), ..QuotationPatch::default() })
            .await
            .expect("second update")
            .expect("record exists");

        assert_eq!(updated.status, QuoteStatus::Negotiating);
        assert_eq!(updated.negotiation_notes.as_deref(), Some("asked for a payment plan"));
        assert_eq!(updated.final_price, Some(Decimal::new(4_100_050, 2)));
        assert!(!updated.negotiable);

        let stored_price: String = sqlx::query("SELECT final_price FROM quotation WHERE id = ?")
            .bind(&created.id.0)
            .fetch_one(&pool)
            .await
            .expect("raw row")
            .get("final_price");
        assert_eq!(stored_price, "41000.50");
    }

    #[tokio::test]
    async fn sql_store_reports_missing_records() {
        let (_pool, store) = setup().await;
        let missing = QuoteId("5b0e1a52-0000-4000-8000-000000000000".to_string());

        assert_eq!(store.get_by_id(&missing).await.expect("get"), None);
        assert_eq!(
            store.update(&missing, QuotationPatch::default()).await.expect("update"),
            None
        );
        assert!(!store.delete(&missing).await.expect("delete"));

        let created = store.create(advanced_submission(0)).await.expect("create");
        assert!(store.delete(&created.id).await.expect("delete"));
        store.ping().await.expect("ping");
    }

    #[tokio::test]
    async fn corrupt_rows_surface_decode_errors() {
        let (pool, store) = setup().await;
        let created = store.create(advanced_submission(0)).await.expect("create");
        sqlx::query("UPDATE quotation SET colors_json = 'not json' WHERE id = ?")
            .bind(&created.id.0)
            .execute(&pool)
            .await
            .expect("corrupt row");

        let error = store.get_by_id(&created.id).await.expect_err("decode failure");
        assert!(error.to_string().contains("colors_json"));
    }
}
