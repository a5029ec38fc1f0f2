//! Reconciliation engine tests
//!
//! Pure-logic coverage for the theory/variance identity, carryover chaining,
//! business-date resolution, and unit conversion:
//! - theory = previous_total + purchases - usage - waste
//! - variance = count_total - theory
//! - chaining is strictly adjacent, a missing day propagates 0 forward

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Expected on-hand from prior count plus inflows minus outflows. Waste is
/// always a deduction regardless of stored sign.
fn theory(previous_total: i64, purchases: i64, usage: i64, waste: i64) -> i64 {
    previous_total + purchases - usage - waste.abs()
}

fn variance(count_total: i64, theory: i64) -> i64 {
    count_total - theory
}

/// previous_total for each day of a trailing series: day k carries day k-1's
/// count_total, zero when day k-1 had no count. `anchor` seeds day 0.
fn chain_previous_totals(anchor: i64, counts: &[Option<i64>]) -> Vec<i64> {
    let mut previous = anchor;
    let mut out = Vec::with_capacity(counts.len());
    for count in counts {
        out.push(previous);
        previous = count.unwrap_or(0);
    }
    out
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use shared::business_date::{resolve_business_date, CutoverPolicy, DayBoundary};
    use shared::conversion::{to_each_units, ConversionFactor};

    /// Full scenario: case_pack 12, previous count 50, purchase of one case
    /// plus 3 each, POS usage 20, waste 2, physical count 42.
    #[test]
    fn test_end_to_end_scenario() {
        let case_pack: i64 = 12;
        let previous_total: i64 = 50;
        let purchases = case_pack * 1 + 3;
        let usage: i64 = 20;
        let waste: i64 = 2;
        let count_total: i64 = 42;

        let theory = theory(previous_total, purchases, usage, waste);
        assert_eq!(theory, 43);
        assert_eq!(variance(count_total, theory), -1);
    }

    #[test]
    fn test_missing_terms_default_to_zero() {
        // No purchase, usage, or waste rows: theory is just the carryover.
        assert_eq!(theory(50, 0, 0, 0), 50);
        // No count recorded: variance is the negative of theory.
        assert_eq!(variance(0, 43), -43);
    }

    #[test]
    fn test_waste_sign_is_normalized() {
        // Feeds sometimes store waste negative; the deduction must not flip.
        assert_eq!(theory(50, 15, 20, -2), theory(50, 15, 20, 2));
        assert_eq!(theory(50, 15, 20, -2), 43);
    }

    /// Counts on day 1 and day 3 but not day 2: day 3's previous_total is
    /// day 2's default 0, not day 1's 100. Chaining is strictly adjacent.
    #[test]
    fn test_carryover_chain_is_strictly_adjacent() {
        let counts = [Some(100), None, Some(80)];
        let previous = chain_previous_totals(0, &counts);

        assert_eq!(previous, vec![0, 100, 0]);
        assert_eq!(previous[2], 0, "day 3 must not see day 1's count");
    }

    #[test]
    fn test_chain_anchor_seeds_first_day() {
        let counts = [Some(40), Some(35)];
        let previous = chain_previous_totals(50, &counts);
        assert_eq!(previous, vec![50, 40]);
    }

    #[test]
    fn test_business_date_boundary() {
        let boundary = DayBoundary {
            policy: CutoverPolicy::FixedHour { hour: 8 },
            utc_offset_minutes: 0,
        };

        let before = Utc.with_ymd_and_hms(2024, 6, 15, 7, 59, 0).unwrap();
        assert_eq!(
            resolve_business_date(before, &boundary),
            NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
        );

        let after = Utc.with_ymd_and_hms(2024, 6, 15, 8, 0, 0).unwrap();
        assert_eq!(
            resolve_business_date(after, &boundary),
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
        );
    }

    #[test]
    fn test_conversion_round_trip() {
        let factor = ConversionFactor {
            ingredient: "BEEF Steak 10oz Sirloin Choice".to_string(),
            weight_qty: Some(dec("5")),
            weight_uofm: Some("lb".to_string()),
            volume_qty: None,
            volume_uofm: None,
            each_qty: Some(dec("1")),
            each_uofm: Some("each".to_string()),
        };

        assert_eq!(to_each_units(dec("10"), "lb", &factor), Some(dec("2")));
    }

    #[test]
    fn test_unconvertible_unit_contributes_nothing() {
        let factor = ConversionFactor {
            ingredient: "Mystery".to_string(),
            ..Default::default()
        };
        // None, not a panic or an error: the edge is skipped.
        assert_eq!(to_each_units(dec("3"), "quart", &factor), None);
    }

    #[test]
    fn test_rounding_happens_only_at_the_end() {
        let factor = ConversionFactor {
            ingredient: "PORK Chop".to_string(),
            weight_qty: Some(dec("5")),
            weight_uofm: Some("lb".to_string()),
            each_qty: Some(dec("1")),
            ..Default::default()
        };

        // Two edges of 3 lb each: summed fractionally then rounded once.
        let a = to_each_units(dec("3"), "lb", &factor).unwrap();
        let b = to_each_units(dec("3"), "lb", &factor).unwrap();
        let total = a + b;
        assert_eq!(total, dec("1.2"));

        use rust_decimal::prelude::ToPrimitive;
        assert_eq!(total.round().to_i64(), Some(1));
        // Rounding each edge first would have given 1 + 1 = 2.
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        /// The reconciliation identity holds exactly for any inputs.
        #[test]
        fn prop_theory_variance_identity(
            previous in -10_000i64..10_000,
            purchases in 0i64..10_000,
            usage in 0i64..10_000,
            waste in -1_000i64..1_000,
            count in 0i64..10_000,
        ) {
            let t = theory(previous, purchases, usage, waste);
            prop_assert_eq!(t, previous + purchases - usage - waste.abs());
            prop_assert_eq!(variance(count, t), count - t);
        }

        /// Recomputation over immutable inputs is idempotent.
        #[test]
        fn prop_recompute_is_idempotent(
            previous in -10_000i64..10_000,
            purchases in 0i64..10_000,
            usage in 0i64..10_000,
            waste in -1_000i64..1_000,
        ) {
            let first = theory(previous, purchases, usage, waste);
            let second = theory(previous, purchases, usage, waste);
            prop_assert_eq!(first, second);
        }

        /// Waste contributes its magnitude regardless of stored sign.
        #[test]
        fn prop_waste_sign_never_inflates_theory(
            previous in -10_000i64..10_000,
            waste in -1_000i64..1_000,
        ) {
            let t = theory(previous, 0, 0, waste);
            prop_assert!(t <= previous);
            prop_assert_eq!(t, theory(previous, 0, 0, -waste));
        }

        /// Every day's previous_total equals the prior day's count_total
        /// (or 0), never an earlier day's.
        #[test]
        fn prop_chain_is_adjacent(
            anchor in 0i64..1_000,
            counts in proptest::collection::vec(
                proptest::option::of(0i64..1_000), 1..14
            ),
        ) {
            let previous = chain_previous_totals(anchor, &counts);
            prop_assert_eq!(previous.len(), counts.len());
            prop_assert_eq!(previous[0], anchor);
            for k in 1..counts.len() {
                prop_assert_eq!(previous[k], counts[k - 1].unwrap_or(0));
            }
        }

        /// A count of zero on a middle day propagates forward as zero.
        #[test]
        fn prop_missing_middle_day_propagates_zero(
            first in 1i64..1_000,
            last in 1i64..1_000,
        ) {
            let counts = [Some(first), None, Some(last)];
            let previous = chain_previous_totals(0, &counts);
            prop_assert_eq!(previous[2], 0);
        }
    }
}
