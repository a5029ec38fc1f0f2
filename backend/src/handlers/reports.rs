//! HTTP handlers for reconciliation report endpoints

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::types::UsagePolicy;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{DailyVarianceReport, ItemDetailReport};
use crate::AppState;

/// Usage-source selection for report queries
#[derive(Debug, Deserialize, Default)]
pub struct ReportQuery {
    #[serde(default)]
    pub policy: UsagePolicy,
}

/// Daily variance report for a store
pub async fn get_variance_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<DailyVarianceReport>> {
    current_user.0.check_store_access(store_id)?;
    let store = crate::services::load_store(&state.db, store_id).await?;

    let report = state
        .report_service()
        .daily_variance_report(&store, query.policy)
        .await?;
    Ok(Json(report))
}

/// Daily variance report for a store, as a CSV download
pub async fn export_variance_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
    Query(query): Query<ReportQuery>,
) -> AppResult<impl IntoResponse> {
    current_user.0.check_store_access(store_id)?;
    let store = crate::services::load_store(&state.db, store_id).await?;

    let service = state.report_service();
    let report = service.daily_variance_report(&store, query.policy).await?;
    let csv = service.daily_variance_csv(&report)?;

    let filename = format!(
        "attachment; filename=\"variance-{}-{}.csv\"",
        store.name.replace(' ', "_"),
        report.business_date
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        csv,
    ))
}

/// Trailing detail and day-of-week trend view for one item
pub async fn get_item_detail(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((store_id, item_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ItemDetailReport>> {
    current_user.0.check_store_access(store_id)?;
    let store = crate::services::load_store(&state.db, store_id).await?;

    let report = state
        .report_service()
        .item_detail_report(&store, item_id, query.policy)
        .await?;
    Ok(Json(report))
}
