//! Bar interval parsing and bucketing, plus timestamp parsing for raw rows.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
/// 1970-01-01 was a Thursday; the first Monday is four days later.
const MONDAY_OFFSET: i64 = 4 * DAY;

const DATETIME_FORMATS: &[&str] = &[
    "%Y.%m.%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y%m%d %H%M%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d", "%Y%m%d"];

/// Parse a timestamp in any of the accepted layouts; a bare date means
/// midnight.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// A fixed bar interval, stored in whole seconds.
///
/// Bucket boundaries are counted from the Unix epoch, except that intervals
/// made of whole weeks start on Monday 00:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timeframe {
    seconds: i64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid timeframe '{0}' (expected e.g. 1min, 15min, 4h, 1d)")]
pub struct TimeframeParseError(pub String);

impl Timeframe {
    pub const MINUTE: Timeframe = Timeframe { seconds: MINUTE };
    pub const FOUR_HOURS: Timeframe = Timeframe { seconds: 4 * HOUR };
    pub const DAILY: Timeframe = Timeframe { seconds: DAY };

    pub fn from_seconds(seconds: i64) -> Option<Self> {
        (seconds > 0).then_some(Self { seconds })
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Start of the bucket containing `timestamp`.
    ///
    /// Intervals dividing a day have their boundaries at midnight.
    pub fn bucket_start(&self, timestamp: NaiveDateTime) -> NaiveDateTime {
        let anchor = if self.seconds % WEEK == 0 {
            MONDAY_OFFSET
        } else {
            0
        };
        let secs = timestamp.and_utc().timestamp() - anchor;
        let start = secs.div_euclid(self.seconds) * self.seconds + anchor;
        DateTime::from_timestamp(start, 0)
            .map(|dt| dt.naive_utc())
            .unwrap_or(timestamp)
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (count, unit) = trimmed.split_at(split);
        let count: i64 = if count.is_empty() {
            1
        } else {
            count
                .parse()
                .map_err(|_| TimeframeParseError(s.to_string()))?
        };

        let unit_seconds = match unit.to_lowercase().as_str() {
            "s" | "sec" | "secs" => 1,
            "m" | "t" | "min" | "mins" => MINUTE,
            "h" | "hr" | "hour" | "hours" => HOUR,
            "d" | "day" | "days" => DAY,
            "w" | "week" | "weeks" => WEEK,
            _ => return Err(TimeframeParseError(s.to_string())),
        };

        count
            .checked_mul(unit_seconds)
            .and_then(Timeframe::from_seconds)
            .ok_or_else(|| TimeframeParseError(s.to_string()))
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.seconds;
        if s % WEEK == 0 {
            write!(f, "{}w", s / WEEK)
        } else if s % DAY == 0 {
            write!(f, "{}d", s / DAY)
        } else if s % HOUR == 0 {
            write!(f, "{}h", s / HOUR)
        } else if s % MINUTE == 0 {
            write!(f, "{}min", s / MINUTE)
        } else {
            write!(f, "{}s", s)
        }
    }
}
