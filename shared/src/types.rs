//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Time-of-day tag for physical counts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum CountTime {
    Am,
    Pm,
}

impl CountTime {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountTime::Am => "AM",
            CountTime::Pm => "PM",
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown count time tag: {0}")]
pub struct ParseCountTimeError(String);

impl std::str::FromStr for CountTime {
    type Err = ParseCountTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AM" => Ok(CountTime::Am),
            "PM" => Ok(CountTime::Pm),
            other => Err(ParseCountTimeError(other.to_string())),
        }
    }
}

/// Which source the Ingredient Usage Calculator should prefer.
///
/// The pre-aggregated feed always wins when rows exist for the target date;
/// `LivePos` only changes behavior for dates the feed has not landed yet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UsagePolicy {
    #[default]
    PreferPreAggregated,
    LivePos,
}

/// Date range for queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}
