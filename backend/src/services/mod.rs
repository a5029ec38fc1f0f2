//! Business logic services

pub mod counts;
pub mod items;
pub mod report;
pub mod usage;
pub mod variance;

pub use counts::CountService;
pub use items::ItemService;
pub use report::ReportService;
pub use usage::UsageService;
pub use variance::VarianceService;

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::business_date::{CutoverPolicy, DayBoundary};
use shared::models::{Item, Store};

use crate::error::{AppError, AppResult};

#[derive(Debug, FromRow)]
struct StoreRow {
    id: Uuid,
    name: String,
    pos_external_id: Option<String>,
    cutover_hour: i32,
    utc_offset_minutes: i32,
    active: bool,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Store {
            id: row.id,
            name: row.name,
            pos_external_id: row.pos_external_id,
            day_boundary: DayBoundary {
                policy: CutoverPolicy::FixedHour {
                    hour: row.cutover_hour.max(0) as u32,
                },
                utc_offset_minutes: row.utc_offset_minutes,
            },
            active: row.active,
        }
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    store_id: Uuid,
    name: String,
    case_pack: i32,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            store_id: row.store_id,
            name: row.name,
            case_pack: row.case_pack,
        }
    }
}

/// Map the first validation failure into the API error shape.
pub(crate) fn validate_input(input: &impl validator::Validate) -> AppResult<()> {
    input.validate().map_err(|errors| {
        let (field, message) = errors
            .field_errors()
            .iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Invalid value".to_string());
                (field.to_string(), message)
            })
            .unwrap_or_else(|| ("input".to_string(), "Invalid input".to_string()));
        AppError::Validation { field, message }
    })
}

/// Load a store by id.
pub async fn load_store(db: &PgPool, store_id: Uuid) -> AppResult<Store> {
    let row = sqlx::query_as::<_, StoreRow>(
        r#"
        SELECT id, name, pos_external_id, cutover_hour, utc_offset_minutes, active
        FROM stores
        WHERE id = $1
        "#,
    )
    .bind(store_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::NotFound("Store".to_string()))?;

    Ok(row.into())
}

/// Load an item, verifying it belongs to the store.
pub async fn load_item(db: &PgPool, store_id: Uuid, item_id: Uuid) -> AppResult<Item> {
    let row = sqlx::query_as::<_, ItemRow>(
        r#"
        SELECT id, store_id, name, case_pack
        FROM items
        WHERE id = $1 AND store_id = $2
        "#,
    )
    .bind(item_id)
    .bind(store_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

    Ok(row.into())
}
