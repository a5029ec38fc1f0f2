//! Pre-aggregated ingredient usage models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the nightly usage feed: ingredient consumption attributed to a
/// menu item for a business date, with unit conversion already applied
/// upstream. The fiscal-calendar columns are denormalized for trend queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientUsageRecord {
    pub id: Uuid,
    pub store_id: Uuid,
    pub trans_date: NaiveDate,
    pub menu_item: String,
    pub ingredient: String,
    /// Menu items sold
    pub sales_count: Decimal,
    /// Ingredient each-units consumed
    pub count_usage: Decimal,
    pub dow: i16,
    pub week: i32,
    pub period: i32,
    pub year: i32,
}
