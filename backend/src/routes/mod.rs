//! Route definitions for the StockCount API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - reconciliation reports
        .nest("/stores/:store_id/reports", report_routes())
        // Protected routes - count and purchase entry
        .nest("/stores/:store_id/counts", count_routes())
        .nest("/stores/:store_id/purchases", purchase_routes())
        .nest("/stores/:store_id/waste", waste_routes())
        // Protected routes - item catalog
        .nest("/stores/:store_id/items", item_routes())
}

/// Reconciliation report routes (protected)
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/variance", get(handlers::get_variance_report))
        .route("/variance/export", get(handlers::export_variance_report))
        .route("/items/:item_id", get(handlers::get_item_detail))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Count entry routes (protected)
fn count_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_counts))
        .route(
            "/:count_id",
            axum::routing::put(handlers::update_count).delete(handlers::delete_count),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Manual purchase routes (protected)
fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_purchase))
        .route(
            "/:purchase_id",
            axum::routing::put(handlers::update_purchase).delete(handlers::delete_purchase),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Waste entry routes (protected)
fn waste_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_waste))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Item catalog routes (protected)
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/:item_id",
            axum::routing::put(handlers::update_item).delete(handlers::delete_item),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}
