//! HTTP request handlers

pub mod counts;
pub mod health;
pub mod items;
pub mod reports;

pub use counts::{
    create_counts, create_purchase, create_waste, delete_count, delete_purchase, update_count,
    update_purchase,
};
pub use health::health_check;
pub use items::{create_item, delete_item, list_items, update_item};
pub use reports::{export_variance_report, get_item_detail, get_variance_report};
