//! Inventory item models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A counted inventory item, owned by a store.
///
/// `case_pack` is the number of each-units per purchasing case; counts and
/// purchases entered as cases are normalized through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub case_pack: i32,
}
