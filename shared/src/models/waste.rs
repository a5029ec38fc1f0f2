//! Waste models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A discarded-quantity row from the waste feed. Some upstream feeds store
/// the quantity negative; the calculator always deducts `quantity.abs()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteRecord {
    pub id: Uuid,
    pub store_id: Uuid,
    pub item_name: String,
    pub trans_date: NaiveDate,
    pub quantity: Decimal,
}
