//! Date-range selection owned by the page controller.
//!
//! A selection is a named range type plus concrete local calendar dates.
//! The backend consumes UTC instants, so the local end date is extended
//! by one day and converted, making the UTC end exclusive and covering
//! the whole local end date regardless of offset.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::{ymd, ymdhms_utc};

#[derive(Debug, Error)]
pub enum TimeError {
    #[error("range start {start} is after end {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
    #[error("local time {0} does not exist in the display timezone")]
    InvalidLocalTime(String),
    #[error("unrecognized range type '{0}'")]
    UnknownRangeType(String),
    #[error("unparseable date '{0}'")]
    BadDate(String),
}

/// Named method used to derive a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeType {
    Custom,
    /// Week to date, weeks starting on Sunday.
    Wtd,
    /// Month to date.
    Mtd,
    /// Year to date.
    Ytd,
    /// The last N days, including today.
    LastDays(u32),
}

impl RangeType {
    /// Route-query form, e.g. `"ytd"` or `"last30days"`.
    pub fn as_route_str(&self) -> String {
        match self {
            Self::Custom => "custom".to_string(),
            Self::Wtd => "wtd".to_string(),
            Self::Mtd => "mtd".to_string(),
            Self::Ytd => "ytd".to_string(),
            Self::LastDays(n) => format!("last{n}days"),
        }
    }

    pub fn from_route_str(s: &str) -> Result<Self, TimeError> {
        match s {
            "custom" => Ok(Self::Custom),
            "wtd" => Ok(Self::Wtd),
            "mtd" => Ok(Self::Mtd),
            "ytd" => Ok(Self::Ytd),
            _ => s
                .strip_prefix("last")
                .and_then(|rest| rest.strip_suffix("days"))
                .and_then(|n| n.parse::<u32>().ok())
                .filter(|n| *n > 0)
                .map(Self::LastDays)
                .ok_or_else(|| TimeError::UnknownRangeType(s.to_string())),
        }
    }
}

/// A `[start, end]` pair of UTC instants, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtcRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl UtcRange {
    /// The `YYYY-MM-DD HH:MM:SS` strings sent to the backend.
    pub fn wire(&self) -> (String, String) {
        (ymdhms_utc(self.start), ymdhms_utc(self.end))
    }
}

/// A concrete date range in local calendar dates, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangeSelection {
    pub range_type: RangeType,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRangeSelection {
    /// Derive a selection from a named range type and today's local date.
    /// `Custom` yields today..today; callers normally reach it through
    /// [`Self::custom`] instead.
    pub fn from_type(range_type: RangeType, today: NaiveDate) -> Self {
        let start = match range_type {
            RangeType::Custom => today,
            RangeType::Wtd => today - Duration::days(today.weekday().num_days_from_sunday() as i64),
            RangeType::Mtd => today.with_day(1).unwrap_or(today),
            RangeType::Ytd => today.with_day(1).and_then(|d| d.with_month(1)).unwrap_or(today),
            RangeType::LastDays(n) => today - Duration::days(n.saturating_sub(1) as i64),
        };
        Self {
            range_type,
            start,
            end: today,
        }
    }

    pub fn custom(start: NaiveDate, end: NaiveDate) -> Result<Self, TimeError> {
        if start > end {
            return Err(TimeError::InvertedRange { start, end });
        }
        Ok(Self {
            range_type: RangeType::Custom,
            start,
            end,
        })
    }

    /// The UTC instant range covering the selection in timezone `tz`:
    /// local start-of-day of `start` through local start-of-day of
    /// `end + 1 day`, end exclusive.
    pub fn utc_range_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<UtcRange, TimeError> {
        let start = local_midnight(tz, self.start)?;
        let end = local_midnight(tz, self.end + Duration::days(1))?;
        Ok(UtcRange {
            start: start.with_timezone(&Utc),
            end: end.with_timezone(&Utc),
        })
    }

    /// The `YYYY-MM-DD` local strings carried in the route query.
    pub fn route_dates(&self) -> (String, String) {
        (ymd(self.start), ymd(self.end))
    }
}

/// Resolve local midnight of `date` in `tz`. A DST transition can make
/// midnight ambiguous (take the earlier instant) or nonexistent (error).
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Result<DateTime<Tz>, TimeError> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| TimeError::InvalidLocalTime(naive.to_string()))
}
