//! Domain models for StockCount

mod count;
mod item;
mod purchase;
mod recipe;
mod report;
mod store;
mod usage;
mod waste;

pub use count::*;
pub use item::*;
pub use purchase::*;
pub use recipe::*;
pub use report::*;
pub use store::*;
pub use usage::*;
pub use waste::*;
