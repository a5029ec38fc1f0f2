//! Point-of-sale order model and aggregation
//!
//! The wire shapes mirror the POS bulk-orders payload: orders contain checks,
//! checks contain selections, and selections nest arbitrarily for combos and
//! modifiers. Aggregation is pure so it can be tested without a live API.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One order from the bulk-orders endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosOrder {
    #[serde(default)]
    pub checks: Vec<PosCheck>,
}

/// A check (ticket) within an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosCheck {
    #[serde(default)]
    pub selections: Vec<PosSelection>,
}

/// A sold line item. `selections` holds nested combo/modifier children whose
/// quantities are NOT included in the parent's quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosSelection {
    pub display_name: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub voided: bool,
    #[serde(default)]
    pub selections: Vec<PosSelection>,
}

/// Sum sold quantities by display name across all orders.
///
/// Voided selections are skipped (their children too). Each nesting level is
/// counted independently. Only names in `allowed` are returned, which bounds
/// the result to menu items relevant to the caller's recipes.
pub fn aggregate_sold_counts(
    orders: &[PosOrder],
    allowed: &HashSet<String>,
) -> HashMap<String, Decimal> {
    let mut totals = HashMap::new();
    for order in orders {
        for check in &order.checks {
            for selection in &check.selections {
                accumulate(selection, allowed, &mut totals);
            }
        }
    }
    totals
}

fn accumulate(
    selection: &PosSelection,
    allowed: &HashSet<String>,
    totals: &mut HashMap<String, Decimal>,
) {
    if selection.voided {
        return;
    }
    if allowed.contains(&selection.display_name) {
        *totals
            .entry(selection.display_name.clone())
            .or_insert(Decimal::ZERO) += selection.quantity;
    }
    for child in &selection.selections {
        accumulate(child, allowed, totals);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn selection(name: &str, qty: &str, voided: bool, children: Vec<PosSelection>) -> PosSelection {
        PosSelection {
            display_name: name.to_string(),
            quantity: dec(qty),
            voided,
            selections: children,
        }
    }

    fn order(selections: Vec<PosSelection>) -> PosOrder {
        PosOrder {
            checks: vec![PosCheck { selections }],
        }
    }

    fn allow(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn nested_quantities_count_independently() {
        let orders = vec![order(vec![selection(
            "Burger",
            "2",
            false,
            vec![selection("Extra Cheese", "2", false, vec![])],
        )])];
        let totals = aggregate_sold_counts(&orders, &allow(&["Burger", "Extra Cheese"]));
        assert_eq!(totals.get("Burger"), Some(&dec("2")));
        assert_eq!(totals.get("Extra Cheese"), Some(&dec("2")));
    }

    #[test]
    fn voided_selections_are_skipped_with_children() {
        let orders = vec![order(vec![
            selection(
                "Burger",
                "1",
                true,
                vec![selection("Extra Cheese", "1", false, vec![])],
            ),
            selection("Burger", "3", false, vec![]),
        ])];
        let totals = aggregate_sold_counts(&orders, &allow(&["Burger", "Extra Cheese"]));
        assert_eq!(totals.get("Burger"), Some(&dec("3")));
        assert_eq!(totals.get("Extra Cheese"), None);
    }

    #[test]
    fn allow_list_bounds_the_result() {
        let orders = vec![order(vec![
            selection("Burger", "2", false, vec![]),
            selection("Soda", "5", false, vec![]),
        ])];
        let totals = aggregate_sold_counts(&orders, &allow(&["Burger"]));
        assert_eq!(totals.len(), 1);
        assert_eq!(totals.get("Burger"), Some(&dec("2")));
    }

    #[test]
    fn quantities_sum_across_orders_and_checks() {
        let orders = vec![
            order(vec![selection("Sirloin 10oz", "1", false, vec![])]),
            order(vec![selection("Sirloin 10oz", "2", false, vec![])]),
        ];
        let totals = aggregate_sold_counts(&orders, &allow(&["Sirloin 10oz"]));
        assert_eq!(totals.get("Sirloin 10oz"), Some(&dec("3")));
    }

    #[test]
    fn deep_nesting_is_walked() {
        let inner = selection("Side Salad", "1", false, vec![]);
        let mid = selection("Combo Meal", "1", false, vec![inner]);
        let orders = vec![order(vec![selection("Dinner For Two", "1", false, vec![mid])])];
        let totals =
            aggregate_sold_counts(&orders, &allow(&["Dinner For Two", "Combo Meal", "Side Salad"]));
        assert_eq!(totals.get("Side Salad"), Some(&dec("1")));
        assert_eq!(totals.get("Combo Meal"), Some(&dec("1")));
        assert_eq!(totals.get("Dinner For Two"), Some(&dec("1")));
    }

    #[test]
    fn payload_shape_deserializes() {
        let raw = r#"{
            "checks": [{
                "selections": [{
                    "displayName": "Burger",
                    "quantity": 2,
                    "voided": false,
                    "selections": [{"displayName": "Extra Cheese", "quantity": 2}]
                }]
            }]
        }"#;
        let order: PosOrder = serde_json::from_str(raw).unwrap();
        assert_eq!(order.checks[0].selections[0].display_name, "Burger");
        assert_eq!(order.checks[0].selections[0].selections.len(), 1);
        assert!(!order.checks[0].selections[0].selections[0].voided);
    }
}
