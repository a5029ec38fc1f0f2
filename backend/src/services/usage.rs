//! Ingredient usage calculation service
//!
//! Maps menu-item sales to ingredient consumption. Two sources: the nightly
//! pre-aggregated usage feed (already unit-converted upstream) and a live
//! walk of the recipe graph against the POS API. Feed rows win whenever they
//! exist for the target date; a landed batch is authoritative.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use shared::conversion::{to_each_units, ConversionFactor};
use shared::models::{RecipeEdge, Store};
use shared::types::UsagePolicy;

use crate::error::AppResult;
use crate::external::PosClient;

/// Ingredient usage service
#[derive(Clone)]
pub struct UsageService {
    db: PgPool,
    pos: PosClient,
}

#[derive(Debug, FromRow)]
struct RecipeEdgeRow {
    id: uuid::Uuid,
    menu_item: Option<String>,
    recipe: String,
    ingredient: String,
    quantity: Decimal,
    uofm: String,
}

impl From<RecipeEdgeRow> for RecipeEdge {
    fn from(row: RecipeEdgeRow) -> Self {
        RecipeEdge {
            id: row.id,
            menu_item: row.menu_item,
            recipe: row.recipe,
            ingredient: row.ingredient,
            quantity: row.quantity,
            uofm: row.uofm,
        }
    }
}

#[derive(Debug, FromRow)]
struct ConversionRow {
    ingredient: String,
    weight_qty: Option<Decimal>,
    weight_uofm: Option<String>,
    volume_qty: Option<Decimal>,
    volume_uofm: Option<String>,
    each_qty: Option<Decimal>,
    each_uofm: Option<String>,
}

impl From<ConversionRow> for ConversionFactor {
    fn from(row: ConversionRow) -> Self {
        ConversionFactor {
            ingredient: row.ingredient,
            weight_qty: row.weight_qty,
            weight_uofm: row.weight_uofm,
            volume_qty: row.volume_qty,
            volume_uofm: row.volume_uofm,
            each_qty: row.each_qty,
            each_uofm: row.each_uofm,
        }
    }
}

impl UsageService {
    pub fn new(db: PgPool, pos: PosClient) -> Self {
        Self { db, pos }
    }

    /// Ingredient each-units consumed at a store on a business date.
    ///
    /// Fractional; callers round at the variance computation point. Never
    /// errors for POS trouble: a failed live fetch degrades to zero usage
    /// for this call only.
    pub async fn usage_for_ingredient(
        &self,
        store: &Store,
        ingredient: &str,
        date: NaiveDate,
        policy: UsagePolicy,
    ) -> AppResult<Decimal> {
        let pre_aggregated: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT SUM(count_usage)
            FROM ingredient_usage
            WHERE store_id = $1 AND LOWER(ingredient) = LOWER($2) AND trans_date = $3
            "#,
        )
        .bind(store.id)
        .bind(ingredient)
        .bind(date)
        .fetch_one(&self.db)
        .await?;

        if let Some(sum) = pre_aggregated {
            return Ok(sum);
        }

        match policy {
            UsagePolicy::PreferPreAggregated => Ok(Decimal::ZERO),
            UsagePolicy::LivePos => match self.live_usage(store, ingredient, date).await {
                Ok(usage) => Ok(usage),
                Err(e) => {
                    tracing::warn!(
                        store_id = %store.id,
                        ingredient,
                        date = %date,
                        error = %e,
                        "live POS usage failed, treating as zero"
                    );
                    Ok(Decimal::ZERO)
                }
            },
        }
    }

    /// Compute usage from live POS sales through the recipe graph.
    async fn live_usage(
        &self,
        store: &Store,
        ingredient: &str,
        date: NaiveDate,
    ) -> AppResult<Decimal> {
        let Some(pos_external_id) = store.pos_external_id.as_deref() else {
            tracing::warn!(store_id = %store.id, "store has no POS integration, usage is zero");
            return Ok(Decimal::ZERO);
        };

        let Some(factor) = self.conversion_factor(ingredient).await? else {
            tracing::warn!(ingredient, "no conversion factor on file, usage is zero");
            return Ok(Decimal::ZERO);
        };

        let per_unit = self.per_menu_item_quantities(ingredient, &factor).await?;
        if per_unit.is_empty() {
            return Ok(Decimal::ZERO);
        }

        let allowed: HashSet<String> = per_unit.keys().cloned().collect();
        let sold = self
            .pos
            .sales_by_menu_item(pos_external_id, date, &allowed)
            .await?;

        let usage = per_unit
            .iter()
            .filter_map(|(menu_item, each_per_sale)| {
                sold.get(menu_item).map(|count| *count * *each_per_sale)
            })
            .sum();

        Ok(usage)
    }

    /// Resolve the recipe graph into each-units consumed per menu item sold.
    ///
    /// Two passes: direct menu-item edges first, then edges whose ingredient
    /// is itself an intermediate recipe name get attributed to every menu
    /// item referencing that recipe. One nesting level only; anything deeper
    /// is a data-quality problem, logged and skipped.
    async fn per_menu_item_quantities(
        &self,
        ingredient: &str,
        factor: &ConversionFactor,
    ) -> AppResult<HashMap<String, Decimal>> {
        let edges = self.edges_for_ingredient(ingredient).await?;
        let mut per_unit: HashMap<String, Decimal> = HashMap::new();

        for edge in edges {
            let Some(each_per_sale) = to_each_units(edge.quantity, &edge.uofm, factor) else {
                tracing::warn!(
                    ingredient,
                    recipe = %edge.recipe,
                    uofm = %edge.uofm,
                    "unconvertible recipe unit, skipping edge"
                );
                continue;
            };

            match &edge.menu_item {
                Some(menu_item) => {
                    *per_unit.entry(menu_item.clone()).or_default() += each_per_sale;
                }
                None => {
                    // Intermediate recipe: find the menu items consuming it.
                    let parents: Vec<String> = sqlx::query_scalar(
                        r#"
                        SELECT DISTINCT menu_item
                        FROM recipe_edges
                        WHERE LOWER(ingredient) = LOWER($1) AND menu_item IS NOT NULL
                        "#,
                    )
                    .bind(&edge.recipe)
                    .fetch_all(&self.db)
                    .await?;

                    if parents.is_empty() {
                        tracing::warn!(
                            ingredient,
                            recipe = %edge.recipe,
                            "recipe nested deeper than one level, skipping edge"
                        );
                        continue;
                    }

                    for menu_item in parents {
                        *per_unit.entry(menu_item).or_default() += each_per_sale;
                    }
                }
            }
        }

        Ok(per_unit)
    }

    async fn edges_for_ingredient(&self, ingredient: &str) -> AppResult<Vec<RecipeEdge>> {
        let rows = sqlx::query_as::<_, RecipeEdgeRow>(
            r#"
            SELECT id, menu_item, recipe, ingredient, quantity, uofm
            FROM recipe_edges
            WHERE LOWER(ingredient) = LOWER($1)
            ORDER BY recipe, menu_item
            "#,
        )
        .bind(ingredient)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(RecipeEdge::from).collect())
    }

    async fn conversion_factor(&self, ingredient: &str) -> AppResult<Option<ConversionFactor>> {
        let row = sqlx::query_as::<_, ConversionRow>(
            r#"
            SELECT ingredient, weight_qty, weight_uofm, volume_qty, volume_uofm,
                   each_qty, each_uofm
            FROM conversion_factors
            WHERE LOWER(ingredient) = LOWER($1)
            "#,
        )
        .bind(ingredient)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(ConversionFactor::from))
    }
}
