//! Report row types
//!
//! Fixed record types per report kind; these are the only contracts the
//! presentation layer consumes.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::DateRange;

/// One row of the store daily variance report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarianceRow {
    pub item_id: Uuid,
    pub item_name: String,
    /// Begin-of-day on hand (previous day's count total)
    pub begin: i64,
    pub purchases: i64,
    pub sales: i64,
    pub waste: i64,
    pub theory: i64,
    pub count: i64,
    pub variance: i64,
}

/// Store daily variance report: every active item, most-negative variance
/// first, with a staleness flag when counting has lapsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyVarianceReport {
    pub store_id: Uuid,
    pub business_date: NaiveDate,
    pub last_count_date: NaiveDate,
    /// Set when the latest count is older than the configured threshold.
    pub stale: bool,
    pub rows: Vec<VarianceRow>,
}

/// One day of the item detail/trend view. `previous_total` is chained from
/// the prior day in the same series, not looked up independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailRow {
    pub trans_date: NaiveDate,
    pub count_total: i64,
    pub purchase_count: i64,
    pub sales_count: i64,
    pub sales_waste: i64,
    pub theory: i64,
    pub daily_variance: i64,
    pub previous_total: i64,
}

/// Average/min/max usage for one day of the week, for forecasting display.
/// Empty groups degrade to zeros, never a division error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DowUsageStat {
    /// 0 = Sunday through 6 = Saturday
    pub dow: i16,
    pub avg_usage: Decimal,
    pub min_usage: Decimal,
    pub max_usage: Decimal,
}

/// Item detail report: trailing window in descending recency plus aggregate
/// statistics for charting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDetailReport {
    pub item_id: Uuid,
    pub item_name: String,
    /// The window the rows cover, inclusive on both ends.
    pub window: DateRange,
    pub rows: Vec<DetailRow>,
    pub dow_stats: Vec<DowUsageStat>,
}
