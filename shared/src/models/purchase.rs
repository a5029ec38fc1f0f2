//! Purchase models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A manually entered purchase. One row per (store, item, date); re-entry
/// replaces rather than accumulates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: Uuid,
    pub store_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub trans_date: NaiveDate,
    pub case_count: i64,
    pub each_count: i64,
    /// case_pack * case_count + each_count
    pub purchase_total: i64,
}

/// A purchase row landed by the ETL feed, already normalized to each-units.
/// Multiple rows per (store, item, date) are summed, never overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseFeedRecord {
    pub id: Uuid,
    pub store_id: Uuid,
    pub item_name: String,
    pub trans_date: NaiveDate,
    pub unit_count: Decimal,
}
