//! HTTP handlers for count and purchase entry endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::types::UsagePolicy;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{CountRecord, PurchaseRecord, WasteRecord};
use crate::services::counts::{CountEntryInput, CountUpdateInput, PurchaseInput, WasteInput};
use crate::AppState;

/// Record a batch of physical counts
pub async fn create_counts(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
    Json(input): Json<CountEntryInput>,
) -> AppResult<(StatusCode, Json<Vec<CountRecord>>)> {
    current_user.0.check_store_access(store_id)?;
    let store = crate::services::load_store(&state.db, store_id).await?;

    let records = state
        .count_service()
        .create_counts(&store, input, UsagePolicy::default())
        .await?;
    Ok((StatusCode::CREATED, Json(records)))
}

/// Update a count record
pub async fn update_count(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((store_id, count_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<CountUpdateInput>,
) -> AppResult<Json<CountRecord>> {
    current_user.0.check_store_access(store_id)?;
    let store = crate::services::load_store(&state.db, store_id).await?;

    let record = state
        .count_service()
        .update_count(&store, count_id, input, UsagePolicy::default())
        .await?;
    Ok(Json(record))
}

/// Delete a count record
pub async fn delete_count(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((store_id, count_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    current_user.0.check_store_access(store_id)?;
    state.count_service().delete_count(store_id, count_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a manual purchase
pub async fn create_purchase(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
    Json(input): Json<PurchaseInput>,
) -> AppResult<(StatusCode, Json<PurchaseRecord>)> {
    current_user.0.check_store_access(store_id)?;
    let store = crate::services::load_store(&state.db, store_id).await?;

    let record = state
        .count_service()
        .create_purchase(&store, input, UsagePolicy::default())
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Record discarded quantity for an item
pub async fn create_waste(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
    Json(input): Json<WasteInput>,
) -> AppResult<(StatusCode, Json<WasteRecord>)> {
    current_user.0.check_store_access(store_id)?;
    let store = crate::services::load_store(&state.db, store_id).await?;

    let record = state
        .count_service()
        .create_waste(&store, input, UsagePolicy::default())
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Update a manual purchase
pub async fn update_purchase(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((store_id, purchase_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<PurchaseInput>,
) -> AppResult<Json<PurchaseRecord>> {
    current_user.0.check_store_access(store_id)?;
    let store = crate::services::load_store(&state.db, store_id).await?;

    let record = state
        .count_service()
        .update_purchase(&store, purchase_id, input, UsagePolicy::default())
        .await?;
    Ok(Json(record))
}

/// Delete a manual purchase
pub async fn delete_purchase(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((store_id, purchase_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    current_user.0.check_store_access(store_id)?;
    let store = crate::services::load_store(&state.db, store_id).await?;

    state
        .count_service()
        .delete_purchase(&store, purchase_id, UsagePolicy::default())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
