//! Unit-of-measure conversion
//!
//! Recipe quantities are written in whatever unit the recipe author used
//! (ounces, quarts, eaches). Physical counts are always in discrete "each"
//! units, so usage derived from recipes has to be normalized through the
//! ingredient's conversion table before it is comparable to a count.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-ingredient conversion bases. Any basis may be missing; recipe data is
/// allowed to be incomplete.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConversionFactor {
    pub ingredient: String,
    pub weight_qty: Option<Decimal>,
    pub weight_uofm: Option<String>,
    pub volume_qty: Option<Decimal>,
    pub volume_uofm: Option<String>,
    pub each_qty: Option<Decimal>,
    pub each_uofm: Option<String>,
}

fn unit_matches(unit: &str, basis: &Option<String>) -> bool {
    basis
        .as_deref()
        .map(|b| b.trim().eq_ignore_ascii_case(unit.trim()))
        .unwrap_or(false)
}

/// Convert `qty` expressed in `unit` into each-units for this ingredient.
///
/// Priority order: weight basis, then volume basis, then an already-each
/// quantity. Returns `None` when no basis applies; callers treat that as a
/// zero contribution rather than an error, so one bad recipe edge cannot
/// abort a report. No rounding happens here: intermediate quantities stay
/// fractional until the variance computation point.
pub fn to_each_units(qty: Decimal, unit: &str, factor: &ConversionFactor) -> Option<Decimal> {
    let each_qty = factor.each_qty.unwrap_or(Decimal::ONE);

    if unit_matches(unit, &factor.weight_uofm) {
        if let Some(weight_qty) = factor.weight_qty {
            if !weight_qty.is_zero() {
                return Some(qty / weight_qty * each_qty);
            }
        }
    }

    if unit_matches(unit, &factor.volume_uofm) {
        if let Some(volume_qty) = factor.volume_qty {
            if !volume_qty.is_zero() {
                return Some(qty / volume_qty * each_qty);
            }
        }
    }

    if unit_matches(unit, &factor.each_uofm) {
        if let Some(each_qty) = factor.each_qty {
            if !each_qty.is_zero() {
                return Some(qty / each_qty);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sirloin() -> ConversionFactor {
        ConversionFactor {
            ingredient: "BEEF Steak 10oz Sirloin Choice".to_string(),
            weight_qty: Some(dec("5")),
            weight_uofm: Some("lb".to_string()),
            volume_qty: None,
            volume_uofm: None,
            each_qty: Some(dec("1")),
            each_uofm: Some("each".to_string()),
        }
    }

    #[test]
    fn weight_basis_round_trip() {
        // 10 lb with a 5 lb / 1 each basis is 2 each units.
        assert_eq!(to_each_units(dec("10"), "lb", &sirloin()), Some(dec("2")));
    }

    #[test]
    fn each_qty_defaults_to_one_for_weight() {
        let factor = ConversionFactor {
            ingredient: "PORK Chop".to_string(),
            weight_qty: Some(dec("8")),
            weight_uofm: Some("oz".to_string()),
            ..Default::default()
        };
        assert_eq!(to_each_units(dec("16"), "oz", &factor), Some(dec("2")));
    }

    #[test]
    fn volume_basis_applies_when_weight_does_not_match() {
        let factor = ConversionFactor {
            ingredient: "SAUCE Marinade".to_string(),
            volume_qty: Some(dec("32")),
            volume_uofm: Some("fl oz".to_string()),
            each_qty: Some(dec("4")),
            ..Default::default()
        };
        // 16 fl oz through a 32 fl oz / 4 each basis.
        assert_eq!(to_each_units(dec("16"), "fl oz", &factor), Some(dec("2")));
    }

    #[test]
    fn each_unit_divides_by_each_qty() {
        let factor = ConversionFactor {
            ingredient: "SEAFOOD Crab Cake".to_string(),
            each_qty: Some(dec("2")),
            each_uofm: Some("each".to_string()),
            ..Default::default()
        };
        assert_eq!(to_each_units(dec("6"), "each", &factor), Some(dec("3")));
    }

    #[test]
    fn unconvertible_unit_is_none_not_panic() {
        assert_eq!(to_each_units(dec("3"), "quart", &sirloin()), None);
        assert_eq!(to_each_units(dec("3"), "lb", &ConversionFactor::default()), None);
    }

    #[test]
    fn unit_comparison_ignores_case_and_whitespace() {
        assert_eq!(to_each_units(dec("5"), " LB ", &sirloin()), Some(dec("1")));
    }

    #[test]
    fn zero_basis_quantity_is_unconvertible() {
        let factor = ConversionFactor {
            ingredient: "Bad Data".to_string(),
            weight_qty: Some(Decimal::ZERO),
            weight_uofm: Some("lb".to_string()),
            ..Default::default()
        };
        assert_eq!(to_each_units(dec("3"), "lb", &factor), None);
    }

    #[test]
    fn no_intermediate_rounding() {
        // 3 lb over a 5 lb basis stays fractional.
        assert_eq!(to_each_units(dec("3"), "lb", &sirloin()), Some(dec("0.6")));
    }
}
