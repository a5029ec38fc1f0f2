//! Shared types and domain logic for StockCount
//!
//! This crate contains the entity types, report row types, and the pure
//! leaf calculators (business-date resolution, unit conversion, POS order
//! aggregation) used by the backend service.

pub mod business_date;
pub mod conversion;
pub mod models;
pub mod pos;
pub mod types;

pub use business_date::*;
pub use conversion::*;
pub use models::*;
pub use types::*;
