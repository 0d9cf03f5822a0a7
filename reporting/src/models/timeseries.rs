//! Binned timeseries model behind the line and stacked-bar charts.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::api::TimeseriesPayload;
use crate::format::{bucket_label_long, bucket_label_short, parse_utc};

/// Bucket-count target for [`TimeseriesData::binsize_of_range`].
const TARGET_BINS: i64 = 100;
/// Snapping tolerance as a fraction of the next-larger unit.
const SNAP_TOLERANCE: f64 = 0.2;

#[derive(Debug, Error)]
pub enum TimeseriesError {
    #[error("series '{id}' has {actual} values for {expected} buckets")]
    LengthMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },
    #[error("response range must have exactly a start and an end, got {0} entries")]
    BadRange(usize),
    #[error("unparseable date '{value}' (format '{format}')")]
    DateParse { value: String, format: String },
}

/// Granularity of a bucket width, largest whole unit it contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinUnit {
    Minute,
    Hour,
    Day,
}

impl fmt::Display for BinUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minute => write!(f, "minute"),
            Self::Hour => write!(f, "hour"),
            Self::Day => write!(f, "day"),
        }
    }
}

/// One named value sequence, positionally aligned with the bucket dates.
/// NaN marks "no data" for a bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: String,
    pub name: String,
    pub values: Vec<f64>,
}

/// Parallel arrays of bucket boundaries and named series, plus the
/// queried range. Immutable after construction; sub-selections are new
/// instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeseriesData {
    pub desc: String,
    /// Queried UTC range, end exclusive.
    pub range: (DateTime<Utc>, DateTime<Utc>),
    /// Bucket width in minutes.
    pub binsize: i64,
    pub dates: Vec<DateTime<Utc>>,
    pub series: Vec<Series>,
}

impl TimeseriesData {
    /// Build from a server payload, parsing wire dates with the formats
    /// the payload itself names and checking the series/bucket alignment
    /// invariant.
    pub fn from_payload(payload: TimeseriesPayload) -> Result<Self, TimeseriesError> {
        if payload.range.len() != 2 {
            return Err(TimeseriesError::BadRange(payload.range.len()));
        }
        let range_format = payload
            .range_parse_format
            .as_deref()
            .unwrap_or("%Y-%m-%d %H:%M:%S");
        let range = (
            parse_wire_date(&payload.range[0], range_format)?,
            parse_wire_date(&payload.range[1], range_format)?,
        );
        let dates = payload
            .dates
            .iter()
            .map(|d| parse_wire_date(d, &payload.date_parse_format))
            .collect::<Result<Vec<_>, _>>()?;
        let series = payload
            .series
            .into_iter()
            .map(|s| {
                if s.values.len() != dates.len() {
                    return Err(TimeseriesError::LengthMismatch {
                        id: s.id,
                        expected: dates.len(),
                        actual: s.values.len(),
                    });
                }
                Ok(Series {
                    id: s.id,
                    name: s.name,
                    values: s.values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            desc = %payload.y,
            buckets = dates.len(),
            series = series.len(),
            binsize = payload.binsize,
            "timeseries constructed"
        );
        Ok(Self {
            desc: payload.y,
            range,
            binsize: payload.binsize,
            dates,
            series,
        })
    }

    pub fn get_series(&self, id: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.id == id)
    }

    /// A new instance restricted to the named series. Dates and range are
    /// kept as-is; ids with no match are silently dropped, so an empty
    /// series set is a valid outcome.
    pub fn subseries(&self, ids: &[&str]) -> Self {
        Self {
            desc: self.desc.clone(),
            range: self.range,
            binsize: self.binsize,
            dates: self.dates.clone(),
            series: self
                .series
                .iter()
                .filter(|s| ids.contains(&s.id.as_str()))
                .cloned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Bucket width normalized to its largest whole unit.
    pub fn binsize_with_unit(&self) -> (BinUnit, i64) {
        let days = self.binsize / (24 * 60);
        let hours = (self.binsize - days * 24 * 60) / 60;
        let mins = self.binsize - days * 24 * 60 - hours * 60;
        if days == 0 && hours == 0 {
            (BinUnit::Minute, mins)
        } else if days == 0 {
            (BinUnit::Hour, hours)
        } else {
            (BinUnit::Day, days)
        }
    }

    /// Bucket width in seconds.
    pub fn binsize_seconds(&self) -> i64 {
        self.binsize * 60
    }

    /// Bucket width in minutes targeting ~100 buckets across the range,
    /// snapped to whole days, then whole hours, unless the remainder
    /// exceeds 20% of the next-larger unit.
    pub fn binsize_of_range(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
        let span_ms = (end - start).num_milliseconds().max(0);
        let per_bin_ms = 1000 * 60 * TARGET_BINS;
        let span_min = (span_ms + per_bin_ms - 1) / per_bin_ms;

        let bin_days = span_min / (24 * 60);
        let bin_hours = (span_min - bin_days * 24 * 60) / 60;
        if bin_days >= 1 {
            let extra = if bin_hours as f64 > 24.0 * SNAP_TOLERANCE {
                bin_hours * 60
            } else {
                0
            };
            return bin_days * 24 * 60 + extra;
        }

        let bin_mins = span_min - bin_days * 24 * 60 - bin_hours * 60;
        if bin_hours >= 1 {
            let extra = if bin_mins as f64 > 60.0 * SNAP_TOLERANCE {
                bin_mins
            } else {
                0
            };
            return bin_hours * 60 + extra;
        }
        bin_mins
    }

    /// Pixel width of one bar given the x pixel range, floored at 1.
    pub fn bar_width(&self, px_range: (f64, f64), bar_spacing: f64) -> f64 {
        let bins =
            (self.range.1 - self.range.0).num_seconds() as f64 / self.binsize_seconds() as f64;
        ((px_range.1 - px_range.0) / bins - bar_spacing).max(1.0)
    }

    /// Bucket label whose precision follows the bucket unit: minute
    /// buckets show hour and minute, hour buckets the hour, day buckets
    /// the date only.
    pub fn bucket_label<Tz: TimeZone>(&self, d: &DateTime<Tz>, short: bool) -> String
    where
        Tz::Offset: fmt::Display,
    {
        let (unit, _) = self.binsize_with_unit();
        if short {
            bucket_label_short(d, unit)
        } else {
            bucket_label_long(d, unit)
        }
    }
}

fn parse_wire_date(value: &str, format: &str) -> Result<DateTime<Utc>, TimeseriesError> {
    parse_utc(value, format).map_err(|_| TimeseriesError::DateParse {
        value: value.to_string(),
        format: format.to_string(),
    })
}
