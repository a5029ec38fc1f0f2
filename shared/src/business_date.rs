//! Business-date resolution
//!
//! A store's trading day does not line up with the calendar day: a ticket
//! rung at 01:30 belongs to the previous day's books. Each store carries an
//! explicit cutover policy rather than an inline hour constant, because the
//! rule has drifted over time (4am, 8am, and evening-based variants have all
//! been in production).

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Named day-boundary rule for a store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum CutoverPolicy {
    /// Timestamps with a local hour before `hour` belong to the previous
    /// calendar day.
    FixedHour { hour: u32 },
}

impl Default for CutoverPolicy {
    fn default() -> Self {
        CutoverPolicy::FixedHour { hour: 8 }
    }
}

/// Per-store day-boundary configuration: the cutover rule plus the store's
/// local UTC offset in minutes. The offset makes resolution independent of
/// the server's zone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayBoundary {
    pub policy: CutoverPolicy,
    pub utc_offset_minutes: i32,
}

impl Default for DayBoundary {
    fn default() -> Self {
        Self {
            policy: CutoverPolicy::default(),
            utc_offset_minutes: 0,
        }
    }
}

impl DayBoundary {
    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
    }
}

/// Resolve the business date a timestamp belongs to under a store's
/// day-boundary configuration.
pub fn resolve_business_date(now: DateTime<Utc>, boundary: &DayBoundary) -> NaiveDate {
    let local = now.with_timezone(&boundary.offset());
    match boundary.policy {
        CutoverPolicy::FixedHour { hour } => {
            if local.hour() < hour {
                local.date_naive().pred_opt().unwrap_or_else(|| local.date_naive())
            } else {
                local.date_naive()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn boundary(hour: u32, offset_minutes: i32) -> DayBoundary {
        DayBoundary {
            policy: CutoverPolicy::FixedHour { hour },
            utc_offset_minutes: offset_minutes,
        }
    }

    #[test]
    fn before_cutover_belongs_to_previous_day() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 7, 59, 0).unwrap();
        let date = resolve_business_date(now, &boundary(8, 0));
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 14).unwrap());
    }

    #[test]
    fn at_cutover_belongs_to_current_day() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 8, 0, 0).unwrap();
        let date = resolve_business_date(now, &boundary(8, 0));
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
    }

    #[test]
    fn four_am_policy_is_representable() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 3, 30, 0).unwrap();
        assert_eq!(
            resolve_business_date(now, &boundary(4, 0)),
            NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
        );
        assert_eq!(
            resolve_business_date(now, &boundary(8, 0)),
            NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
        );
    }

    #[test]
    fn uses_store_local_zone_not_utc() {
        // 12:30 UTC is 06:30 in UTC-6, still before an 8am cutover.
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 0).unwrap();
        let date = resolve_business_date(now, &boundary(8, -360));
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 14).unwrap());
    }

    #[test]
    fn local_day_rollover_crosses_month() {
        // 02:00 local on the 1st resolves to the last day of the prior month.
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 2, 0, 0).unwrap();
        let date = resolve_business_date(now, &boundary(8, 0));
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
    }
}
