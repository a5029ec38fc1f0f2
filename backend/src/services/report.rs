//! Reconciliation report building service
//!
//! Read-only orchestration over the variance calculator: the per-store daily
//! variance ranking and the per-item trailing detail view. Per-item failures
//! degrade a single row; the one surfaced error state is a store with no
//! counts at all, because nothing can be anchored without one.

use chrono::{NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use rust_decimal::Decimal;
use shared::business_date::resolve_business_date;
use shared::models::{
    DailyVarianceReport, DetailRow, DowUsageStat, Item, ItemDetailReport, Store, VarianceRow,
};
use shared::types::{DateRange, UsagePolicy};

use crate::config::ReportConfig;
use crate::error::{AppError, AppResult};
use crate::services::variance::{reconcile, FlowTerms, VarianceService};

/// Report building service
#[derive(Clone)]
pub struct ReportService {
    db: PgPool,
    variance: VarianceService,
    stale_after_days: i64,
    detail_window_days: i64,
}

/// One day's raw inputs for the detail series, before chaining.
#[derive(Debug, Clone, Copy)]
pub struct DaySample {
    pub trans_date: NaiveDate,
    /// Recorded count, `None` when no count was entered that day.
    pub count_total: Option<i64>,
    pub flows: FlowTerms,
}

#[derive(Debug, FromRow)]
struct DowStatRow {
    dow: i16,
    avg_usage: Option<Decimal>,
    min_usage: Option<Decimal>,
    max_usage: Option<Decimal>,
}

impl ReportService {
    pub fn new(db: PgPool, variance: VarianceService, config: &ReportConfig) -> Self {
        Self {
            db,
            variance,
            stale_after_days: config.stale_after_days,
            detail_window_days: config.detail_window_days,
        }
    }

    /// Daily variance report for every item in a store, most-negative
    /// variance first.
    pub async fn daily_variance_report(
        &self,
        store: &Store,
        policy: UsagePolicy,
    ) -> AppResult<DailyVarianceReport> {
        let last_count_date = self
            .last_count_date(store.id)
            .await?
            .ok_or(AppError::NoCountsRecorded)?;

        let business_date = resolve_business_date(Utc::now(), &store.day_boundary);
        let stale = (business_date - last_count_date).num_days() > self.stale_after_days;

        let items = self.store_items(store.id).await?;
        let mut rows = Vec::with_capacity(items.len());

        for item in &items {
            match self.variance.compute(store, item, business_date, policy).await {
                Ok(terms) => rows.push(VarianceRow {
                    item_id: item.id,
                    item_name: item.name.clone(),
                    begin: terms.previous_total,
                    purchases: terms.purchases,
                    sales: terms.usage,
                    waste: terms.waste,
                    theory: terms.theory,
                    count: terms.count_total,
                    variance: terms.variance,
                }),
                Err(e) => {
                    tracing::error!(
                        store_id = %store.id,
                        item_id = %item.id,
                        error = %e,
                        "reconciliation failed for item, dropping row"
                    );
                }
            }
        }

        rows.sort_by(|a, b| {
            a.variance
                .cmp(&b.variance)
                .then_with(|| a.item_name.cmp(&b.item_name))
        });

        Ok(DailyVarianceReport {
            store_id: store.id,
            business_date,
            last_count_date,
            stale,
            rows,
        })
    }

    /// Trailing per-day detail for one item, newest day first, plus
    /// day-of-week usage aggregates for forecasting display.
    pub async fn item_detail_report(
        &self,
        store: &Store,
        item_id: Uuid,
        policy: UsagePolicy,
    ) -> AppResult<ItemDetailReport> {
        let item = super::load_item(&self.db, store.id, item_id).await?;

        self.last_count_date(store.id)
            .await?
            .ok_or(AppError::NoCountsRecorded)?;

        let end = resolve_business_date(Utc::now(), &store.day_boundary);
        let start = end - chrono::Duration::days(self.detail_window_days - 1);

        let mut samples = Vec::with_capacity(self.detail_window_days as usize);
        let mut day = start;
        while day <= end {
            let count_total = self.variance.count_on(store.id, item.id, day).await?;
            let flows = self.variance.flows(store, &item, day, policy).await?;
            samples.push(DaySample {
                trans_date: day,
                count_total,
                flows,
            });
            day = day.succ_opt().unwrap_or(day);
        }

        let anchor = self.variance.count_before(store.id, item.id, start).await?;
        let mut rows = chain_detail_series(anchor, &samples);
        rows.reverse();

        let dow_stats = self.dow_usage_stats(store.id, &item.name).await?;

        Ok(ItemDetailReport {
            item_id: item.id,
            item_name: item.name,
            window: DateRange { start, end },
            rows,
            dow_stats,
        })
    }

    /// Serialize a daily variance report's rows as CSV.
    pub fn daily_variance_csv(&self, report: &DailyVarianceReport) -> AppResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &report.rows {
            writer
                .serialize(row)
                .map_err(|e| AppError::Internal(format!("CSV serialization failed: {}", e)))?;
        }
        writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV flush failed: {}", e)))
    }

    /// Average/min/max usage grouped by day of week, every dow present and
    /// zero-filled. The AVG never divides by zero because absent groups
    /// simply produce no row.
    async fn dow_usage_stats(
        &self,
        store_id: Uuid,
        item_name: &str,
    ) -> AppResult<Vec<DowUsageStat>> {
        let rows = sqlx::query_as::<_, DowStatRow>(
            r#"
            SELECT dow,
                   AVG(count_usage) AS avg_usage,
                   MIN(count_usage) AS min_usage,
                   MAX(count_usage) AS max_usage
            FROM ingredient_usage
            WHERE store_id = $1 AND LOWER(ingredient) = LOWER($2)
            GROUP BY dow
            ORDER BY dow
            "#,
        )
        .bind(store_id)
        .bind(item_name)
        .fetch_all(&self.db)
        .await?;

        let mut stats: Vec<DowUsageStat> = (0..7)
            .map(|dow| DowUsageStat {
                dow,
                avg_usage: Decimal::ZERO,
                min_usage: Decimal::ZERO,
                max_usage: Decimal::ZERO,
            })
            .collect();

        for row in rows {
            if let Some(stat) = stats.get_mut(row.dow as usize) {
                stat.avg_usage = row.avg_usage.unwrap_or(Decimal::ZERO);
                stat.min_usage = row.min_usage.unwrap_or(Decimal::ZERO);
                stat.max_usage = row.max_usage.unwrap_or(Decimal::ZERO);
            }
        }

        Ok(stats)
    }

    async fn store_items(&self, store_id: Uuid) -> AppResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, super::ItemRow>(
            r#"
            SELECT id, store_id, name, case_pack
            FROM items
            WHERE store_id = $1
            ORDER BY name
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn last_count_date(&self, store_id: Uuid) -> AppResult<Option<NaiveDate>> {
        let date: Option<NaiveDate> = sqlx::query_scalar(
            r#"SELECT MAX(trans_date) FROM counts WHERE store_id = $1"#,
        )
        .bind(store_id)
        .fetch_one(&self.db)
        .await?;

        Ok(date)
    }
}

/// Chain raw day samples into an internally consistent detail series.
///
/// Day k's `previous_total` is day k-1's `count_total` within the series,
/// zero when day k-1 recorded no count. Chaining is strictly adjacent: a
/// missing middle day contributes 0 forward, it does not fall back to the
/// most recent recorded count. `anchor` seeds the first day from the last
/// count recorded before the window.
pub fn chain_detail_series(anchor: i64, samples: &[DaySample]) -> Vec<DetailRow> {
    let mut rows = Vec::with_capacity(samples.len());
    let mut previous_total = anchor;

    for sample in samples {
        let count_total = sample.count_total.unwrap_or(0);
        let terms = reconcile(
            count_total,
            previous_total,
            sample.flows.purchases,
            sample.flows.usage,
            sample.flows.waste,
        );
        rows.push(DetailRow {
            trans_date: sample.trans_date,
            count_total: terms.count_total,
            purchase_count: terms.purchases,
            sales_count: terms.usage,
            sales_waste: terms.waste,
            theory: terms.theory,
            daily_variance: terms.variance,
            previous_total: terms.previous_total,
        });
        previous_total = count_total;
    }

    rows
}
