//! Reporting windows used by the summary endpoints.

use chrono::{Duration, Months, TimeZone, Utc};

use crate::types::Timestamp;

/// A named reporting window ending now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Today,
    Week,
    Month,
    Quarter,
    Year,
}

impl Period {
    /// Parse a `?period=` value. Accepted: `today`, `week`, `month`,
    /// `quarter`, `year`.
    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            other => Err(format!(
                "Invalid period '{other}'. Must be one of: today, week, month, quarter, year"
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }

    /// Inclusive start of the window relative to `now`.
    ///
    /// `Today` starts at UTC midnight. The others are rolling windows of
    /// seven days, one month, three months and one year.
    pub fn start(self, now: Timestamp) -> Timestamp {
        match self {
            Self::Today => start_of_day(now),
            Self::Week => now - Duration::days(7),
            Self::Month => now.checked_sub_months(Months::new(1)).unwrap_or(now),
            Self::Quarter => now.checked_sub_months(Months::new(3)).unwrap_or(now),
            Self::Year => now.checked_sub_months(Months::new(12)).unwrap_or(now),
        }
    }
}

/// UTC midnight of the day containing `ts`.
pub fn start_of_day(ts: Timestamp) -> Timestamp {
    let date = ts.date_naive();
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}
