use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ConversationListing, LedgerEntry};

pub const DEFAULT_LIMIT: usize = 8;

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

// -- Best --

/// Time window for the best listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    All,
    Year,
    #[default]
    Day,
}

impl Period {
    /// Parse a query value. Anything unrecognised means the default window.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::All => "all",
            Period::Year => "year",
            Period::Day => "day",
        }
    }

    /// Earliest timestamp (nanoseconds since the epoch) inside the window
    /// ending at `now`: midnight UTC of the current day or January 1st of
    /// the current year.
    pub fn since(&self, now: DateTime<Utc>) -> u64 {
        let start = match self {
            Period::All => return 0,
            Period::Year => NaiveDate::from_ymd_opt(now.year(), 1, 1),
            Period::Day => Some(now.date_naive()),
        };
        start
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .and_then(|midnight| midnight.and_utc().timestamp_nanos_opt())
            .map(|nanos| nanos.max(0) as u64)
            .unwrap_or(0)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Period::All),
            "year" => Ok(Period::Year),
            "day" => Ok(Period::Day),
            other => Err(format!("unknown period: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BestQuery {
    #[serde(default)]
    pub period: Period,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for BestQuery {
    fn default() -> Self {
        Self {
            period: Period::default(),
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BestPage {
    pub listings: Vec<ConversationListing>,
    pub period: Period,
    /// Limit to request for the next, longer page.
    pub more_limit: usize,
}

// -- Recent --

#[derive(Debug, Clone, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for RecentQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecentPage {
    pub listings: Vec<ConversationListing>,
    pub more_limit: usize,
}

// -- Ledger --

/// Column the ledger view is ordered by, always descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerSort {
    Alias,
    Minted,
    Burned,
    Bought,
    Sold,
    Earned,
    Spent,
    #[default]
    Balance,
}

impl LedgerSort {
    pub const ALL: [LedgerSort; 8] = [
        LedgerSort::Alias,
        LedgerSort::Minted,
        LedgerSort::Burned,
        LedgerSort::Bought,
        LedgerSort::Sold,
        LedgerSort::Earned,
        LedgerSort::Spent,
        LedgerSort::Balance,
    ];

    /// Parse a query value. Anything unrecognised sorts by balance.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerSort::Alias => "alias",
            LedgerSort::Minted => "minted",
            LedgerSort::Burned => "burned",
            LedgerSort::Bought => "bought",
            LedgerSort::Sold => "sold",
            LedgerSort::Earned => "earned",
            LedgerSort::Spent => "spent",
            LedgerSort::Balance => "balance",
        }
    }
}

impl fmt::Display for LedgerSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LedgerSort::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown ledger sort: {}", s))
    }
}

#[derive(Debug, Serialize)]
pub struct LedgerPage {
    pub entries: Vec<LedgerEntry>,
    pub sort: LedgerSort,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_window_starts_at_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 13, 45, 10).unwrap();
        let midnight = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(
            Period::Day.since(now),
            midnight.timestamp_nanos_opt().unwrap() as u64
        );
    }

    #[test]
    fn year_window_starts_on_january_first() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 13, 45, 10).unwrap();
        let new_year = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            Period::Year.since(now),
            new_year.timestamp_nanos_opt().unwrap() as u64
        );
    }

    #[test]
    fn all_window_has_no_boundary() {
        assert_eq!(Period::All.since(Utc::now()), 0);
    }

    #[test]
    fn unknown_values_fall_back_to_defaults() {
        assert_eq!(Period::parse_lenient("week"), Period::Day);
        assert_eq!(Period::parse_lenient("year"), Period::Year);
        assert_eq!(LedgerSort::parse_lenient("karma"), LedgerSort::Balance);
        assert_eq!(LedgerSort::parse_lenient("spent"), LedgerSort::Spent);
    }

    #[test]
    fn best_query_defaults() {
        let query: BestQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.period, Period::Day);
        assert_eq!(query.limit, DEFAULT_LIMIT);

        let query: BestQuery = serde_json::from_str(r#"{"period":"all","limit":3}"#).unwrap();
        assert_eq!(query.period, Period::All);
        assert_eq!(query.limit, 3);
    }
}
