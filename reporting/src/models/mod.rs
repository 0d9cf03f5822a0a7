//! Domain models for the reporting dashboard.
//!
//! - [`time`]: named date-range selection and UTC range derivation
//! - [`timeseries`]: binned time/value series and the bin-size heuristic
//! - [`column`]: semantic column kinds and cell rendering
//! - [`table`]: table model built from compact server payloads
//! - [`mail`]: mail-specific row flagging and connection dispositions

pub mod column;
pub mod mail;
pub mod table;
pub mod time;
pub mod timeseries;

pub use column::{Align, ColumnDef, ColumnKind, MergeFormatter};
pub use mail::MailReportTable;
pub use table::{ReportTable, TableRow};
pub use time::{DateRangeSelection, RangeType, TimeError, UtcRange};
pub use timeseries::{BinUnit, Series, TimeseriesData};
