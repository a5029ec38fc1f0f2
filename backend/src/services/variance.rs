//! Theory and variance calculation service
//!
//! The reconciliation identity for any (store, item, date):
//!
//!   theory   = previous_total + purchases - usage - waste
//!   variance = count_total - theory
//!
//! Every right-hand term defaults to zero when no record exists. Absence of
//! data is never an error here; callers decide what an empty store means.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use shared::models::{Item, Store};
use shared::types::UsagePolicy;

use crate::error::AppResult;
use crate::services::usage::UsageService;

/// All terms of one reconciliation, in each-units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VarianceTerms {
    pub count_total: i64,
    pub previous_total: i64,
    pub purchases: i64,
    pub usage: i64,
    pub waste: i64,
    pub theory: i64,
    pub variance: i64,
}

/// Expected on-hand quantity from prior count plus inflows minus outflows.
pub fn theory(previous_total: i64, purchases: i64, usage: i64, waste: i64) -> i64 {
    previous_total + purchases - usage - waste.abs()
}

/// Physical count minus theory; negative means apparent shrinkage.
pub fn variance(count_total: i64, theory: i64) -> i64 {
    count_total - theory
}

/// Combine raw terms into a full reconciliation record.
pub fn reconcile(
    count_total: i64,
    previous_total: i64,
    purchases: i64,
    usage: i64,
    waste: i64,
) -> VarianceTerms {
    let theory = theory(previous_total, purchases, usage, waste);
    VarianceTerms {
        count_total,
        previous_total,
        purchases,
        usage,
        waste: waste.abs(),
        theory,
        variance: variance(count_total, theory),
    }
}

/// The inflow/outflow terms of a reconciliation, before any count is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowTerms {
    pub purchases: i64,
    pub usage: i64,
    pub waste: i64,
}

/// Theory and variance calculation service
#[derive(Clone)]
pub struct VarianceService {
    db: PgPool,
    usage: UsageService,
}

impl VarianceService {
    pub fn new(db: PgPool, usage: UsageService) -> Self {
        Self { db, usage }
    }

    /// Full reconciliation for (store, item, date).
    pub async fn compute(
        &self,
        store: &Store,
        item: &Item,
        date: NaiveDate,
        policy: UsagePolicy,
    ) -> AppResult<VarianceTerms> {
        let count_total = self.count_on(store.id, item.id, date).await?.unwrap_or(0);
        let previous_total = self.count_before(store.id, item.id, date).await?;
        let flows = self.flows(store, item, date, policy).await?;

        Ok(reconcile(
            count_total,
            previous_total,
            flows.purchases,
            flows.usage,
            flows.waste,
        ))
    }

    /// Purchases, usage and waste for (store, item, date), all zero-defaulted.
    pub async fn flows(
        &self,
        store: &Store,
        item: &Item,
        date: NaiveDate,
        policy: UsagePolicy,
    ) -> AppResult<FlowTerms> {
        let purchases = self.purchases_on(store.id, item, date).await?;

        let usage = self
            .usage
            .usage_for_ingredient(store, &item.name, date, policy)
            .await?;

        let waste: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT SUM(ABS(quantity))
            FROM waste_feed
            WHERE store_id = $1 AND item_name = $2 AND trans_date = $3
            "#,
        )
        .bind(store.id)
        .bind(&item.name)
        .bind(date)
        .fetch_one(&self.db)
        .await?;

        Ok(FlowTerms {
            purchases,
            usage: round_each_units(usage),
            waste: round_each_units(waste.unwrap_or(Decimal::ZERO)),
        })
    }

    /// Recorded count for the exact date. A day may carry an AM and a PM
    /// entry; the later tag wins.
    pub async fn count_on(
        &self,
        store_id: uuid::Uuid,
        item_id: uuid::Uuid,
        date: NaiveDate,
    ) -> AppResult<Option<i64>> {
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT count_total
            FROM counts
            WHERE store_id = $1 AND item_id = $2 AND trans_date = $3
            ORDER BY count_time DESC
            LIMIT 1
            "#,
        )
        .bind(store_id)
        .bind(item_id)
        .bind(date)
        .fetch_optional(&self.db)
        .await?;

        Ok(count)
    }

    /// Most recent count strictly before `date`, zero when none exists.
    pub async fn count_before(
        &self,
        store_id: uuid::Uuid,
        item_id: uuid::Uuid,
        date: NaiveDate,
    ) -> AppResult<i64> {
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT count_total
            FROM counts
            WHERE store_id = $1 AND item_id = $2 AND trans_date < $3
            ORDER BY trans_date DESC, count_time DESC
            LIMIT 1
            "#,
        )
        .bind(store_id)
        .bind(item_id)
        .bind(date)
        .fetch_optional(&self.db)
        .await?;

        Ok(count.unwrap_or(0))
    }

    /// Purchases for the date. A manually entered row wins outright; without
    /// one, the ETL feed rows are summed. Feed rows accumulate, manual rows
    /// are single-per-date.
    async fn purchases_on(
        &self,
        store_id: uuid::Uuid,
        item: &Item,
        date: NaiveDate,
    ) -> AppResult<i64> {
        let manual: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT purchase_total
            FROM purchases
            WHERE store_id = $1 AND item_id = $2 AND trans_date = $3
            "#,
        )
        .bind(store_id)
        .bind(item.id)
        .bind(date)
        .fetch_optional(&self.db)
        .await?;

        if let Some(total) = manual {
            return Ok(total);
        }

        let feed: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT SUM(unit_count)
            FROM purchase_feed
            WHERE store_id = $1 AND item_name = $2 AND trans_date = $3
            "#,
        )
        .bind(store_id)
        .bind(&item.name)
        .bind(date)
        .fetch_one(&self.db)
        .await?;

        Ok(round_each_units(feed.unwrap_or(Decimal::ZERO)))
    }
}

/// Round a fractional each-unit quantity to the integer grid counts live on.
/// This is the only rounding point in the pipeline.
pub fn round_each_units(qty: Decimal) -> i64 {
    qty.round().to_i64().unwrap_or(0)
}
