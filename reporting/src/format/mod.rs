//! Number and date formatting for charts and tables.
//!
//! All functions here are pure; locale configuration is passed in
//! explicitly via [`NumberFormat`]. Dates arrive from the server as UTC
//! strings in fixed formats and are converted to a display timezone only
//! at render time.
//!
//! - [`number`]: grouped, decimal, percent, human-size formatting
//! - [`date`]: fixed-format parsing, wire emitters, render formats,
//!   timespan decomposition

pub mod date;
pub mod number;

pub use date::{
    bucket_label_long, bucket_label_short, dt_long, dt_short, format_timespan, parse_utc, ymd,
    ymdhms_utc, TimespanUnit,
};
pub use number::NumberFormat;
