//! Physical count models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::CountTime;

/// A recorded physical count for (store, item, date, time tag).
///
/// `previous_total`, `theory` and `daily_variance` are denormalized snapshots
/// taken at entry time; the report builder recomputes live values and does
/// not trust these after later edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountRecord {
    pub id: Uuid,
    pub store_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub trans_date: NaiveDate,
    pub count_time: CountTime,
    pub case_count: i64,
    pub each_count: i64,
    /// case_pack * case_count + each_count
    pub count_total: i64,
    pub previous_total: i64,
    pub theory: i64,
    pub daily_variance: i64,
}
