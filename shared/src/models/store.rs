//! Store models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::business_date::DayBoundary;

/// A restaurant location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    /// External POS restaurant identifier; absent for stores without a POS
    /// integration (live usage falls back to zero for them).
    pub pos_external_id: Option<String>,
    pub day_boundary: DayBoundary,
    pub active: bool,
}
