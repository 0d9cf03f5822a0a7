//! Date parsing, wire-format emitters, and display formats.
//!
//! All dates exchanged with the backend are UTC strings in fixed formats
//! supplied by the server (e.g. `%Y-%m-%d %H:%M:%S`). Conversion to a
//! display timezone happens only here, at render time.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::timeseries::BinUnit;

/// Parse a fixed-format UTC date string.
///
/// Accepts both datetime formats (`%Y-%m-%d %H:%M:%S`) and date-only
/// formats (`%Y-%m-%d`, interpreted as midnight UTC).
pub fn parse_utc(s: &str, format: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match NaiveDateTime::parse_from_str(s, format) {
        Ok(naive) => Ok(Utc.from_utc_datetime(&naive)),
        Err(first) => match NaiveDate::parse_from_str(s, format) {
            Ok(date) => Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))),
            Err(_) => Err(first),
        },
    }
}

/// `YYYY-MM-DD` wire form of a local calendar date.
pub fn ymd(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DD HH:MM:SS` wire form of a UTC instant.
pub fn ymdhms_utc(d: DateTime<Utc>) -> String {
    d.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Long display form with weekday, e.g.
/// `"Wednesday, January 15, 2020, 3:04:05 PM"`.
pub fn dt_long<Tz: TimeZone>(d: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    d.format("%A, %B %-d, %Y, %-I:%M:%S %p").to_string()
}

/// Short numeric display form, e.g. `"1/15/2020, 3:04:05 PM"`.
pub fn dt_short<Tz: TimeZone>(d: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    d.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

/// Long bucket label whose time precision follows the bucket unit.
pub fn bucket_label_long<Tz: TimeZone>(d: &DateTime<Tz>, unit: BinUnit) -> String
where
    Tz::Offset: fmt::Display,
{
    let fmt = match unit {
        BinUnit::Minute => "%A, %B %-d, %Y, %-I:%M %p",
        BinUnit::Hour => "%A, %B %-d, %Y, %-I %p",
        BinUnit::Day => "%A, %B %-d, %Y",
    };
    d.format(fmt).to_string()
}

/// Short bucket label whose time precision follows the bucket unit.
pub fn bucket_label_short<Tz: TimeZone>(d: &DateTime<Tz>, unit: BinUnit) -> String
where
    Tz::Offset: fmt::Display,
{
    let fmt = match unit {
        BinUnit::Minute => "%-m/%-d/%Y, %-I:%M %p",
        BinUnit::Hour => "%-m/%-d/%Y, %-I %p",
        BinUnit::Day => "%-m/%-d/%Y",
    };
    d.format(fmt).to_string()
}

/// Maximum output precision for [`format_timespan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimespanUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
    Millis,
}

impl TimespanUnit {
    /// Parse the wire forms used by column type descriptors
    /// (`"s"`, `"second"`, `"ms"`, ...).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "d" | "day" | "days" => Some(Self::Days),
            "h" | "hour" | "hours" => Some(Self::Hours),
            "m" | "minute" | "minutes" => Some(Self::Minutes),
            "s" | "second" | "seconds" => Some(Self::Seconds),
            "ms" | "millisecond" | "milliseconds" => Some(Self::Millis),
            _ => None,
        }
    }

    /// Milliseconds-per-unit conversion factor for values stored in this
    /// unit on the wire.
    pub fn millis_factor(self) -> f64 {
        match self {
            Self::Days => 24.0 * 60.0 * 60.0 * 1000.0,
            Self::Hours => 60.0 * 60.0 * 1000.0,
            Self::Minutes => 60.0 * 1000.0,
            Self::Seconds => 1000.0,
            Self::Millis => 1.0,
        }
    }

    fn short(self) -> &'static str {
        match self {
            Self::Days => "d",
            Self::Hours => "h",
            Self::Minutes => "m",
            Self::Seconds => "s",
            Self::Millis => "ms",
        }
    }
}

/// Decompose a millisecond duration into `2d 3h 15m` form.
///
/// Leading zero components are skipped; once a non-zero component has
/// been emitted every following component down to `max_unit` appears,
/// zeros included. An all-zero duration renders as the empty string.
pub fn format_timespan(milliseconds: f64, max_unit: TimespanUnit) -> String {
    let mut remainder = if milliseconds.is_nan() {
        0
    } else {
        milliseconds.max(0.0).round() as u64
    };
    let units = [
        TimespanUnit::Days,
        TimespanUnit::Hours,
        TimespanUnit::Minutes,
        TimespanUnit::Seconds,
        TimespanUnit::Millis,
    ];
    let mut out: Vec<String> = Vec::new();
    let mut started = false;
    for unit in units {
        let per = unit.millis_factor() as u64;
        let amount = remainder / per;
        remainder %= per;
        if started || amount > 0 {
            started = true;
            out.push(format!("{}{}", amount, unit.short()));
        }
        if unit == max_unit {
            break;
        }
    }
    out.join(" ")
}
