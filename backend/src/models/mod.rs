//! Database-facing models for StockCount
//!
//! Re-exports the shared domain types; row mapping lives in the services.

pub use shared::models::*;
