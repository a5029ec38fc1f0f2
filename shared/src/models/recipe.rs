//! Recipe graph models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One edge of the recipe graph: a menu item consumes `quantity` `uofm` of
/// `ingredient` per unit sold, through an intermediate `recipe` grouping.
///
/// `menu_item` is nullable: some edges hang off an intermediate recipe that
/// is itself listed as an ingredient elsewhere. Resolution is a two-pass
/// lookup (one observed nesting level), not unbounded recursion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeEdge {
    pub id: Uuid,
    pub menu_item: Option<String>,
    pub recipe: String,
    pub ingredient: String,
    pub quantity: Decimal,
    pub uofm: String,
}
