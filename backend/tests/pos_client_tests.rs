//! POS sales client tests
//!
//! Pure-logic coverage for the client's decision points:
//! - token reuse versus refresh near expiry
//! - pagination termination (short page, max_pages ceiling)
//! - business-date wire format
//! - order aggregation through the shared model

use chrono::{DateTime, Duration, NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;

use shared::pos::{aggregate_sold_counts, PosOrder};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// A cached token is reused only while it has more than the skew left.
fn token_is_fresh(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at - now > Duration::seconds(60)
}

/// Fetch another page only after a full page and below the ceiling.
fn fetch_next_page(batch_len: usize, page_size: usize, page: u32, max_pages: u32) -> bool {
    batch_len >= page_size && page < max_pages
}

/// The bulk-orders endpoint takes the business date as YYYYMMDD.
fn business_date_param(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_token_reused_well_before_expiry() {
        let now = Utc::now();
        assert!(token_is_fresh(now + Duration::minutes(30), now));
    }

    #[test]
    fn test_token_refreshed_inside_skew() {
        let now = Utc::now();
        // 59 seconds left is inside the 60 second skew.
        assert!(!token_is_fresh(now + Duration::seconds(59), now));
        assert!(token_is_fresh(now + Duration::seconds(61), now));
    }

    #[test]
    fn test_expired_token_is_never_reused() {
        let now = Utc::now();
        assert!(!token_is_fresh(now - Duration::seconds(1), now));
    }

    #[test]
    fn test_short_page_terminates_pagination() {
        // 37 rows against a page size of 100 is the last page.
        assert!(!fetch_next_page(37, 100, 1, 50));
    }

    #[test]
    fn test_full_page_continues_pagination() {
        assert!(fetch_next_page(100, 100, 1, 50));
    }

    #[test]
    fn test_max_pages_ceiling_stops_a_full_page() {
        // Upstream keeps returning full pages; the ceiling still stops us.
        assert!(!fetch_next_page(100, 100, 50, 50));
    }

    #[test]
    fn test_business_date_wire_format() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        assert_eq!(business_date_param(date), "20240605");
    }

    #[test]
    fn test_aggregation_from_wire_payload() {
        let raw = r#"[
            {"checks": [{"selections": [
                {"displayName": "Sirloin 10oz", "quantity": 2, "voided": false,
                 "selections": [{"displayName": "Add Shrimp", "quantity": 1}]},
                {"displayName": "Sirloin 10oz", "quantity": 1, "voided": true}
            ]}]}
        ]"#;
        let orders: Vec<PosOrder> = serde_json::from_str(raw).unwrap();

        let allowed: HashSet<String> =
            ["Sirloin 10oz", "Add Shrimp"].iter().map(|s| s.to_string()).collect();
        let totals = aggregate_sold_counts(&orders, &allowed);

        assert_eq!(totals.get("Sirloin 10oz"), Some(&dec("2")));
        assert_eq!(totals.get("Add Shrimp"), Some(&dec("1")));
    }

    #[test]
    fn test_empty_order_list_aggregates_to_nothing() {
        let allowed: HashSet<String> = ["Burger".to_string()].into_iter().collect();
        let totals = aggregate_sold_counts(&[], &allowed);
        assert!(totals.is_empty());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        /// Pagination always halts within max_pages regardless of upstream
        /// page sizes.
        #[test]
        fn prop_pagination_is_bounded(
            page_size in 1usize..200,
            max_pages in 1u32..60,
            batches in proptest::collection::vec(0usize..200, 1..100),
        ) {
            let mut page: u32 = 1;
            let mut fetched = 0u32;
            for batch in &batches {
                fetched += 1;
                let len = (*batch).min(page_size);
                if !fetch_next_page(len, page_size, page, max_pages) {
                    break;
                }
                page += 1;
            }
            prop_assert!(fetched <= max_pages);
        }

        /// The freshness check is monotone: once a token needs a refresh it
        /// keeps needing one as time advances.
        #[test]
        fn prop_freshness_is_monotone(
            ttl in -300i64..300,
            advance in 0i64..300,
        ) {
            let now = Utc::now();
            let expires_at = now + Duration::seconds(ttl);
            let later = now + Duration::seconds(advance);
            if !token_is_fresh(expires_at, now) {
                prop_assert!(!token_is_fresh(expires_at, later));
            }
        }

        /// Aggregation never returns a name outside the allow-list.
        #[test]
        fn prop_allow_list_is_a_hard_bound(
            names in proptest::collection::vec("[A-Z][a-z]{2,8}", 1..10),
            quantities in proptest::collection::vec(1u32..20, 1..10),
        ) {
            let selections: Vec<shared::pos::PosSelection> = names
                .iter()
                .zip(quantities.iter())
                .map(|(name, qty)| shared::pos::PosSelection {
                    display_name: name.clone(),
                    quantity: Decimal::from(*qty),
                    voided: false,
                    selections: vec![],
                })
                .collect();
            let orders = vec![PosOrder {
                checks: vec![shared::pos::PosCheck { selections }],
            }];

            let allowed: HashSet<String> = names.iter().take(2).cloned().collect();
            let totals = aggregate_sold_counts(&orders, &allowed);
            for name in totals.keys() {
                prop_assert!(allowed.contains(name));
            }
        }
    }
}
