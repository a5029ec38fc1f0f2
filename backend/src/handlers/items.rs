//! HTTP handlers for item catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::Item;
use crate::services::items::ItemInput;
use crate::AppState;

/// List a store's items
pub async fn list_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<Vec<Item>>> {
    current_user.0.check_store_access(store_id)?;
    let items = state.item_service().list_items(store_id).await?;
    Ok(Json(items))
}

/// Add an item to a store's catalog
pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
    Json(input): Json<ItemInput>,
) -> AppResult<(StatusCode, Json<Item>)> {
    current_user.0.check_store_access(store_id)?;
    let item = state.item_service().create_item(store_id, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Update an item's name or case pack
pub async fn update_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((store_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<ItemInput>,
) -> AppResult<Json<Item>> {
    current_user.0.check_store_access(store_id)?;
    let item = state
        .item_service()
        .update_item(store_id, item_id, input)
        .await?;
    Ok(Json(item))
}

/// Delete an item and its history
pub async fn delete_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((store_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    current_user.0.check_store_access(store_id)?;
    state.item_service().delete_item(store_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
