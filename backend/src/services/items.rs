//! Item catalog service
//!
//! Items are per-store: name plus case pack size. Deleting an item cascades
//! its count and manual purchase history so the catalog cannot strand
//! orphaned rows; feed tables key by item name and are left untouched.

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use shared::models::Item;

use crate::error::{AppError, AppResult};

/// Item catalog service
#[derive(Clone)]
pub struct ItemService {
    db: PgPool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ItemInput {
    #[validate(length(min = 1, max = 128, message = "Item name is required"))]
    pub name: String,
    #[validate(range(min = 1, message = "Case pack must be at least 1"))]
    pub case_pack: i32,
}

impl ItemService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All items for a store, by name.
    pub async fn list_items(&self, store_id: Uuid) -> AppResult<Vec<Item>> {
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

    /// Add an item to a store's catalog. Names are unique within a store.
    pub async fn create_item(&self, store_id: Uuid, input: ItemInput) -> AppResult<Item> {
        super::validate_input(&input)?;
        let name = input.name.trim().to_string();

        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM items WHERE store_id = $1 AND LOWER(name) = LOWER($2)
            )
            "#,
        )
        .bind(store_id)
        .bind(&name)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry(format!("item {}", name)));
        }

        let row = sqlx::query_as::<_, super::ItemRow>(
            r#"
            INSERT INTO items (id, store_id, name, case_pack)
            VALUES ($1, $2, $3, $4)
            RETURNING id, store_id, name, case_pack
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(store_id)
        .bind(&name)
        .bind(input.case_pack)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(store_id = %store_id, item = %name, "created item");
        Ok(row.into())
    }

    /// Rename an item or change its case pack. The name change propagates to
    /// the denormalized name on count and purchase rows.
    pub async fn update_item(
        &self,
        store_id: Uuid,
        item_id: Uuid,
        input: ItemInput,
    ) -> AppResult<Item> {
        super::validate_input(&input)?;
        let name = input.name.trim().to_string();

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, super::ItemRow>(
            r#"
            UPDATE items
            SET name = $1, case_pack = $2
            WHERE id = $3 AND store_id = $4
            RETURNING id, store_id, name, case_pack
            "#,
        )
        .bind(&name)
        .bind(input.case_pack)
        .bind(item_id)
        .bind(store_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        sqlx::query(r#"UPDATE counts SET item_name = $1 WHERE item_id = $2"#)
            .bind(&name)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(r#"UPDATE purchases SET item_name = $1 WHERE item_id = $2"#)
            .bind(&name)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Remove an item and cascade its count and manual purchase history.
    pub async fn delete_item(&self, store_id: Uuid, item_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query(r#"DELETE FROM counts WHERE item_id = $1 AND store_id = $2"#)
            .bind(item_id)
            .bind(store_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(r#"DELETE FROM purchases WHERE item_id = $1 AND store_id = $2"#)
            .bind(item_id)
            .bind(store_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(r#"DELETE FROM items WHERE id = $1 AND store_id = $2"#)
            .bind(item_id)
            .bind(store_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item".to_string()));
        }

        tx.commit().await?;
        tracing::info!(store_id = %store_id, item_id = %item_id, "deleted item with history");
        Ok(())
    }

}
