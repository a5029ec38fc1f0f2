//! Count and purchase entry service
//!
//! Manual data entry: batch physical counts per (date, AM/PM tag), single
//! manual purchase rows per (item, date), and the snapshot recalculation
//! that keeps the latest count's stored theory/variance honest after the
//! flows feeding it change.
//!
//! Snapshots are entry-time denormalizations. Reports recompute live values
//! and never trust them; edits are last-write-wins.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::models::{CountRecord, Item, PurchaseRecord, Store, WasteRecord};
use shared::types::{CountTime, UsagePolicy};

use crate::error::{AppError, AppResult};
use crate::services::validate_input as validate;
use crate::services::variance::{reconcile, VarianceService};

/// Count and purchase entry service
#[derive(Clone)]
pub struct CountService {
    db: PgPool,
    variance: VarianceService,
}

/// Batch count entry for one (date, time tag)
#[derive(Debug, Deserialize, Validate)]
pub struct CountEntryInput {
    pub trans_date: NaiveDate,
    pub count_time: CountTime,
    #[validate(length(min = 1, message = "At least one item count is required"))]
    pub counts: Vec<ItemCountInput>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ItemCountInput {
    pub item_id: Uuid,
    #[validate(range(min = 0, message = "Case count cannot be negative"))]
    pub case_count: i64,
    #[validate(range(min = 0, message = "Each count cannot be negative"))]
    pub each_count: i64,
}

/// Single count update; the snapshot is recomputed against the new date.
#[derive(Debug, Deserialize, Validate)]
pub struct CountUpdateInput {
    pub trans_date: NaiveDate,
    pub count_time: CountTime,
    #[validate(range(min = 0, message = "Case count cannot be negative"))]
    pub case_count: i64,
    #[validate(range(min = 0, message = "Each count cannot be negative"))]
    pub each_count: i64,
}

/// Manual waste entry. Rows accumulate like the feed's; quantity is stored
/// as given and consumers take the absolute value.
#[derive(Debug, Deserialize)]
pub struct WasteInput {
    pub item_id: Uuid,
    pub trans_date: NaiveDate,
    pub quantity: rust_decimal::Decimal,
}

/// Manual purchase entry, one row per (item, date)
#[derive(Debug, Deserialize, Validate)]
pub struct PurchaseInput {
    pub item_id: Uuid,
    pub trans_date: NaiveDate,
    #[validate(range(min = 0, message = "Case count cannot be negative"))]
    pub case_count: i64,
    #[validate(range(min = 0, message = "Each count cannot be negative"))]
    pub each_count: i64,
}

#[derive(Debug, FromRow)]
struct CountRow {
    id: Uuid,
    store_id: Uuid,
    item_id: Uuid,
    item_name: String,
    trans_date: NaiveDate,
    count_time: String,
    case_count: i64,
    each_count: i64,
    count_total: i64,
    previous_total: i64,
    theory: i64,
    daily_variance: i64,
}

impl From<CountRow> for CountRecord {
    fn from(row: CountRow) -> Self {
        CountRecord {
            id: row.id,
            store_id: row.store_id,
            item_id: row.item_id,
            item_name: row.item_name,
            trans_date: row.trans_date,
            count_time: row.count_time.parse().unwrap_or(CountTime::Pm),
            case_count: row.case_count,
            each_count: row.each_count,
            count_total: row.count_total,
            previous_total: row.previous_total,
            theory: row.theory,
            daily_variance: row.daily_variance,
        }
    }
}

#[derive(Debug, FromRow)]
struct WasteRow {
    id: Uuid,
    store_id: Uuid,
    item_name: String,
    trans_date: NaiveDate,
    quantity: rust_decimal::Decimal,
}

impl From<WasteRow> for WasteRecord {
    fn from(row: WasteRow) -> Self {
        WasteRecord {
            id: row.id,
            store_id: row.store_id,
            item_name: row.item_name,
            trans_date: row.trans_date,
            quantity: row.quantity,
        }
    }
}

#[derive(Debug, FromRow)]
struct PurchaseRow {
    id: Uuid,
    store_id: Uuid,
    item_id: Uuid,
    item_name: String,
    trans_date: NaiveDate,
    case_count: i64,
    each_count: i64,
    purchase_total: i64,
}

impl From<PurchaseRow> for PurchaseRecord {
    fn from(row: PurchaseRow) -> Self {
        PurchaseRecord {
            id: row.id,
            store_id: row.store_id,
            item_id: row.item_id,
            item_name: row.item_name,
            trans_date: row.trans_date,
            case_count: row.case_count,
            each_count: row.each_count,
            purchase_total: row.purchase_total,
        }
    }
}

impl CountService {
    pub fn new(db: PgPool, variance: VarianceService) -> Self {
        Self { db, variance }
    }

    /// Record a batch of physical counts for one (date, time tag).
    /// Re-entry of an already counted (item, date, tag) is a conflict.
    pub async fn create_counts(
        &self,
        store: &Store,
        input: CountEntryInput,
        policy: UsagePolicy,
    ) -> AppResult<Vec<CountRecord>> {
        validate(&input)?;

        let mut recorded = Vec::with_capacity(input.counts.len());
        for entry in &input.counts {
            validate(entry)?;
            let item = super::load_item(&self.db, store.id, entry.item_id).await?;

            if self
                .count_exists(store.id, item.id, input.trans_date, input.count_time, None)
                .await?
            {
                return Err(AppError::DuplicateEntry(format!(
                    "{} on {} {}",
                    item.name,
                    input.trans_date,
                    input.count_time.as_str()
                )));
            }

            let record = self
                .insert_count(
                    store,
                    &item,
                    input.trans_date,
                    input.count_time,
                    entry.case_count,
                    entry.each_count,
                    policy,
                )
                .await?;
            recorded.push(record);
        }

        tracing::info!(
            store_id = %store.id,
            trans_date = %input.trans_date,
            count_time = input.count_time.as_str(),
            items = recorded.len(),
            "recorded physical counts"
        );
        Ok(recorded)
    }

    /// Update a count record, recomputing its snapshot against the new date.
    pub async fn update_count(
        &self,
        store: &Store,
        count_id: Uuid,
        input: CountUpdateInput,
        policy: UsagePolicy,
    ) -> AppResult<CountRecord> {
        validate(&input)?;

        let existing = self.find_count(store.id, count_id).await?;
        let item = super::load_item(&self.db, store.id, existing.item_id).await?;

        if self
            .count_exists(
                store.id,
                item.id,
                input.trans_date,
                input.count_time,
                Some(count_id),
            )
            .await?
        {
            return Err(AppError::DuplicateEntry(format!(
                "{} on {} {}",
                item.name,
                input.trans_date,
                input.count_time.as_str()
            )));
        }

        let count_total = item.case_pack as i64 * input.case_count + input.each_count;
        let snapshot = self
            .snapshot_terms(store, &item, input.trans_date, count_total, policy)
            .await?;

        let row = sqlx::query_as::<_, CountRow>(
            r#"
            UPDATE counts
            SET trans_date = $1, count_time = $2, case_count = $3, each_count = $4,
                count_total = $5, previous_total = $6, theory = $7, daily_variance = $8
            WHERE id = $9 AND store_id = $10
            RETURNING id, store_id, item_id, item_name, trans_date, count_time,
                      case_count, each_count, count_total, previous_total, theory,
                      daily_variance
            "#,
        )
        .bind(input.trans_date)
        .bind(input.count_time.as_str())
        .bind(input.case_count)
        .bind(input.each_count)
        .bind(count_total)
        .bind(snapshot.previous_total)
        .bind(snapshot.theory)
        .bind(snapshot.variance)
        .bind(count_id)
        .bind(store.id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Delete a count record.
    pub async fn delete_count(&self, store_id: Uuid, count_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(r#"DELETE FROM counts WHERE id = $1 AND store_id = $2"#)
            .bind(count_id)
            .bind(store_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Count record".to_string()));
        }
        Ok(())
    }

    /// Record a manual purchase. One row per (item, date); the manual row
    /// overrides the ETL feed for that date.
    pub async fn create_purchase(
        &self,
        store: &Store,
        input: PurchaseInput,
        policy: UsagePolicy,
    ) -> AppResult<PurchaseRecord> {
        validate(&input)?;

        let item = super::load_item(&self.db, store.id, input.item_id).await?;

        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM purchases
                WHERE store_id = $1 AND item_id = $2 AND trans_date = $3
            )
            "#,
        )
        .bind(store.id)
        .bind(item.id)
        .bind(input.trans_date)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry(format!(
                "purchase of {} on {}",
                item.name, input.trans_date
            )));
        }

        let purchase_total = item.case_pack as i64 * input.case_count + input.each_count;
        let row = sqlx::query_as::<_, PurchaseRow>(
            r#"
            INSERT INTO purchases (id, store_id, item_id, item_name, trans_date,
                                   case_count, each_count, purchase_total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, store_id, item_id, item_name, trans_date, case_count,
                      each_count, purchase_total
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(store.id)
        .bind(item.id)
        .bind(&item.name)
        .bind(input.trans_date)
        .bind(input.case_count)
        .bind(input.each_count)
        .bind(purchase_total)
        .fetch_one(&self.db)
        .await?;

        self.recalculate_latest(store, &item, policy).await?;
        Ok(row.into())
    }

    /// Update a manual purchase row.
    pub async fn update_purchase(
        &self,
        store: &Store,
        purchase_id: Uuid,
        input: PurchaseInput,
        policy: UsagePolicy,
    ) -> AppResult<PurchaseRecord> {
        validate(&input)?;

        let item = super::load_item(&self.db, store.id, input.item_id).await?;
        let purchase_total = item.case_pack as i64 * input.case_count + input.each_count;

        let row = sqlx::query_as::<_, PurchaseRow>(
            r#"
            UPDATE purchases
            SET trans_date = $1, case_count = $2, each_count = $3, purchase_total = $4
            WHERE id = $5 AND store_id = $6
            RETURNING id, store_id, item_id, item_name, trans_date, case_count,
                      each_count, purchase_total
            "#,
        )
        .bind(input.trans_date)
        .bind(input.case_count)
        .bind(input.each_count)
        .bind(purchase_total)
        .bind(purchase_id)
        .bind(store.id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase record".to_string()))?;

        self.recalculate_latest(store, &item, policy).await?;
        Ok(row.into())
    }

    /// Delete a manual purchase row and refresh the affected snapshot.
    pub async fn delete_purchase(
        &self,
        store: &Store,
        purchase_id: Uuid,
        policy: UsagePolicy,
    ) -> AppResult<()> {
        let item_id: Option<Uuid> = sqlx::query_scalar(
            r#"DELETE FROM purchases WHERE id = $1 AND store_id = $2 RETURNING item_id"#,
        )
        .bind(purchase_id)
        .bind(store.id)
        .fetch_optional(&self.db)
        .await?;

        let Some(item_id) = item_id else {
            return Err(AppError::NotFound("Purchase record".to_string()));
        };

        let item = super::load_item(&self.db, store.id, item_id).await?;
        self.recalculate_latest(store, &item, policy).await
    }

    /// Record discarded quantity for an item and refresh its snapshot.
    pub async fn create_waste(
        &self,
        store: &Store,
        input: WasteInput,
        policy: UsagePolicy,
    ) -> AppResult<WasteRecord> {
        let item = super::load_item(&self.db, store.id, input.item_id).await?;

        let row = sqlx::query_as::<_, WasteRow>(
            r#"
            INSERT INTO waste_feed (id, store_id, item_name, trans_date, quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, store_id, item_name, trans_date, quantity
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(store.id)
        .bind(&item.name)
        .bind(input.trans_date)
        .bind(input.quantity)
        .fetch_one(&self.db)
        .await?;

        self.recalculate_latest(store, &item, policy).await?;
        Ok(row.into())
    }

    /// Recompute the stored theory/variance snapshot on the most recent
    /// count row for an item, after the flows feeding it changed.
    pub async fn recalculate_latest(
        &self,
        store: &Store,
        item: &Item,
        policy: UsagePolicy,
    ) -> AppResult<()> {
        let latest = sqlx::query_as::<_, CountRow>(
            r#"
            SELECT id, store_id, item_id, item_name, trans_date, count_time,
                   case_count, each_count, count_total, previous_total, theory,
                   daily_variance
            FROM counts
            WHERE store_id = $1 AND item_id = $2
            ORDER BY trans_date DESC, count_time DESC
            LIMIT 1
            "#,
        )
        .bind(store.id)
        .bind(item.id)
        .fetch_optional(&self.db)
        .await?;

        let Some(latest) = latest else {
            return Ok(());
        };

        let flows = self
            .variance
            .flows(store, item, latest.trans_date, policy)
            .await?;
        let terms = reconcile(
            latest.count_total,
            latest.previous_total,
            flows.purchases,
            flows.usage,
            flows.waste,
        );

        sqlx::query(r#"UPDATE counts SET theory = $1, daily_variance = $2 WHERE id = $3"#)
            .bind(terms.theory)
            .bind(terms.variance)
            .bind(latest.id)
            .execute(&self.db)
            .await?;

        tracing::debug!(
            item_id = %item.id,
            trans_date = %latest.trans_date,
            theory = terms.theory,
            variance = terms.variance,
            "recalculated count snapshot"
        );
        Ok(())
    }

    async fn insert_count(
        &self,
        store: &Store,
        item: &Item,
        trans_date: NaiveDate,
        count_time: CountTime,
        case_count: i64,
        each_count: i64,
        policy: UsagePolicy,
    ) -> AppResult<CountRecord> {
        let count_total = item.case_pack as i64 * case_count + each_count;
        let snapshot = self
            .snapshot_terms(store, item, trans_date, count_total, policy)
            .await?;

        let row = sqlx::query_as::<_, CountRow>(
            r#"
            INSERT INTO counts (id, store_id, item_id, item_name, trans_date, count_time,
                                case_count, each_count, count_total, previous_total,
                                theory, daily_variance)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, store_id, item_id, item_name, trans_date, count_time,
                      case_count, each_count, count_total, previous_total, theory,
                      daily_variance
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(store.id)
        .bind(item.id)
        .bind(&item.name)
        .bind(trans_date)
        .bind(count_time.as_str())
        .bind(case_count)
        .bind(each_count)
        .bind(count_total)
        .bind(snapshot.previous_total)
        .bind(snapshot.theory)
        .bind(snapshot.variance)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Entry-time snapshot terms for a count about to be written.
    async fn snapshot_terms(
        &self,
        store: &Store,
        item: &Item,
        trans_date: NaiveDate,
        count_total: i64,
        policy: UsagePolicy,
    ) -> AppResult<crate::services::variance::VarianceTerms> {
        let previous_total = self
            .variance
            .count_before(store.id, item.id, trans_date)
            .await?;
        let flows = self.variance.flows(store, item, trans_date, policy).await?;
        Ok(reconcile(
            count_total,
            previous_total,
            flows.purchases,
            flows.usage,
            flows.waste,
        ))
    }

    async fn find_count(&self, store_id: Uuid, count_id: Uuid) -> AppResult<CountRecord> {
        let row = sqlx::query_as::<_, CountRow>(
            r#"
            SELECT id, store_id, item_id, item_name, trans_date, count_time,
                   case_count, each_count, count_total, previous_total, theory,
                   daily_variance
            FROM counts
            WHERE id = $1 AND store_id = $2
            "#,
        )
        .bind(count_id)
        .bind(store_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Count record".to_string()))?;

        Ok(row.into())
    }

    async fn count_exists(
        &self,
        store_id: Uuid,
        item_id: Uuid,
        trans_date: NaiveDate,
        count_time: CountTime,
        exclude: Option<Uuid>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM counts
                WHERE store_id = $1 AND item_id = $2 AND trans_date = $3
                  AND count_time = $4 AND ($5::uuid IS NULL OR id <> $5)
            )
            "#,
        )
        .bind(store_id)
        .bind(item_id)
        .bind(trans_date)
        .bind(count_time.as_str())
        .bind(exclude)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }
}
