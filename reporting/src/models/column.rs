//! Semantic column definitions.
//!
//! The server describes each table column with a compact type descriptor,
//! either a bare tag (`"number/size"`) or an object carrying parameters.
//! Descriptors resolve once, at table construction, into a [`ColumnKind`]
//! that drives cell rendering and alignment. Rows never carry formatting
//! logic.

use std::fmt;
use std::sync::Arc;

use chrono::TimeZone;
use serde::Deserialize;
use serde_json::Value;

use crate::format::{dt_long, dt_short, format_timespan, parse_utc, NumberFormat, TimespanUnit};
use crate::format::number::DecimalStyle;
use crate::models::table::TableRow;

/// Replacement display formatter installed by column combination.
/// Receives the cell value, the column key, and the whole row.
pub type MergeFormatter = Arc<dyn Fn(&Value, &str, &TableRow) -> String + Send + Sync>;

/// Wire form of a column type descriptor.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldType {
    Tag(String),
    Spec {
        #[serde(rename = "type")]
        type_tag: String,
        subtype: Option<String>,
        label: Option<String>,
        places: Option<u8>,
        format: Option<String>,
        showas: Option<String>,
        unit: Option<String>,
    },
}

/// Display precision of a datetime column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeShow {
    Short,
    Long,
}

/// Resolved semantic type of a column. Unrecognized descriptors fall
/// back to `Text` and pass values through unformatted.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKind {
    Text,
    /// Locale-grouped integer-ish value, e.g. `5,001`.
    Number,
    /// Human-readable byte size, e.g. `5.1K`.
    Size { places: u8 },
    Decimal { places: u8 },
    Percent { places: u8 },
    DateTime {
        show: DateTimeShow,
        /// Parse format for string cells, e.g. `%Y-%m-%d %H:%M:%S`.
        format: Option<String>,
    },
    /// Duration decomposed as `2d 3h 15m`. `unit` is the wire unit of
    /// the raw value.
    Timespan { unit: TimespanUnit },
}

impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Number | Self::Size { .. } | Self::Decimal { .. } | Self::Percent { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// A resolved column: key, optional display label, semantic kind, and
/// presentation hints.
#[derive(Clone)]
pub struct ColumnDef {
    pub key: String,
    pub label: Option<String>,
    pub kind: ColumnKind,
    pub align: Align,
    pub nowrap: bool,
    /// Installed by `combine_columns`; takes precedence over `kind`.
    pub merge_formatter: Option<MergeFormatter>,
}

impl fmt::Debug for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("align", &self.align)
            .field("nowrap", &self.nowrap)
            .field("merge_formatter", &self.merge_formatter.as_ref().map(|_| "fn"))
            .finish()
    }
}

impl ColumnDef {
    /// Resolve a wire descriptor for the column named `key`.
    pub fn resolve(key: &str, field_type: &FieldType) -> Self {
        let (mut type_tag, mut subtype, label, places, format, showas, unit) = match field_type {
            FieldType::Tag(tag) => (tag.clone(), None, None, None, None, None, None),
            FieldType::Spec {
                type_tag,
                subtype,
                label,
                places,
                format,
                showas,
                unit,
            } => (
                type_tag.clone(),
                subtype.clone(),
                label.clone(),
                *places,
                format.clone(),
                showas.clone(),
                unit.clone(),
            ),
        };

        // a bare tag may carry its subtype inline, e.g. "number/size"
        if subtype.is_none() {
            if let Some((t, s)) = type_tag.split_once('/') {
                let (t, s) = (t.to_string(), s.to_string());
                type_tag = t;
                subtype = Some(s);
            }
        }
        // "decimal" is shorthand for "number/decimal"
        if type_tag == "decimal" {
            type_tag = "number".to_string();
            subtype = Some("decimal".to_string());
        }

        let kind = match (type_tag.as_str(), subtype.as_deref()) {
            ("number", Some("plain")) | ("number", None) => ColumnKind::Number,
            ("number", Some("decimal")) => match places {
                Some(p) => ColumnKind::Decimal { places: p },
                None => ColumnKind::Number,
            },
            ("number", Some("size")) => ColumnKind::Size {
                places: places.unwrap_or(1),
            },
            ("number", Some("percent")) => ColumnKind::Percent {
                places: places.unwrap_or(0),
            },
            ("datetime", _) => ColumnKind::DateTime {
                show: match showas.as_deref() {
                    Some("long") => DateTimeShow::Long,
                    _ => DateTimeShow::Short,
                },
                format,
            },
            ("time", Some("span")) => ColumnKind::Timespan {
                unit: unit
                    .as_deref()
                    .and_then(TimespanUnit::from_tag)
                    .unwrap_or(TimespanUnit::Millis),
            },
            _ => ColumnKind::Text,
        };

        let align = if kind.is_numeric() {
            Align::Right
        } else {
            Align::Left
        };
        let nowrap = matches!(kind, ColumnKind::Size { .. });

        Self {
            key: key.to_string(),
            label,
            kind,
            align,
            nowrap,
            merge_formatter: None,
        }
    }

    /// Display label, falling back to the key.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }

    /// Render one cell. The merge formatter, when installed, replaces
    /// kind-driven formatting entirely.
    pub fn render<Tz: TimeZone>(
        &self,
        value: &Value,
        row: &TableRow,
        numbers: &NumberFormat,
        tz: &Tz,
    ) -> String
    where
        Tz::Offset: fmt::Display,
    {
        if let Some(formatter) = &self.merge_formatter {
            return formatter(value, &self.key, row);
        }
        match &self.kind {
            ColumnKind::Text => plain_text(value),
            ColumnKind::Number => numbers.number(as_f64(value)),
            ColumnKind::Size { places } => numbers.human_size(as_f64(value), *places),
            ColumnKind::Decimal { places } => {
                numbers.decimal(as_f64(value), *places, DecimalStyle::Decimal)
            }
            ColumnKind::Percent { places } => numbers.percent(as_f64(value), *places),
            ColumnKind::DateTime { show, format } => {
                let parsed = match (value.as_str(), format) {
                    (Some(s), Some(f)) => parse_utc(s, f).ok(),
                    _ => None,
                };
                match parsed {
                    Some(d) => {
                        let local = d.with_timezone(tz);
                        match show {
                            DateTimeShow::Short => dt_short(&local),
                            DateTimeShow::Long => dt_long(&local),
                        }
                    }
                    None => plain_text(value),
                }
            }
            ColumnKind::Timespan { unit } => {
                format_timespan(as_f64(value) * unit.millis_factor(), TimespanUnit::Seconds)
            }
        }
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Text form of an arbitrary cell value; nulls render empty.
pub(crate) fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn render(def: &ColumnDef, value: Value) -> String {
        let row = TableRow::default();
        def.render(&value, &row, &NumberFormat::en(), &Utc)
    }

    #[test]
    fn test_resolve_bare_tags() {
        let def = ColumnDef::resolve("count", &FieldType::Tag("number/plain".into()));
        assert_eq!(def.kind, ColumnKind::Number);
        assert_eq!(def.align, Align::Right);

        let def = ColumnDef::resolve("bytes", &FieldType::Tag("number/size".into()));
        assert_eq!(def.kind, ColumnKind::Size { places: 1 });
        assert!(def.nowrap);

        let def = ColumnDef::resolve("who", &FieldType::Tag("text/email".into()));
        assert_eq!(def.kind, ColumnKind::Text);
        assert_eq!(def.align, Align::Left);
    }

    #[test]
    fn test_resolve_spec_descriptor() {
        let ft: FieldType = serde_json::from_value(json!({
            "type": "text/plain",
            "label": "Count"
        }))
        .unwrap();
        let def = ColumnDef::resolve("count", &ft);
        assert_eq!(def.display_label(), "Count");

        let ft: FieldType = serde_json::from_value(json!({
            "type": "decimal",
            "places": 2
        }))
        .unwrap();
        let def = ColumnDef::resolve("load", &ft);
        assert_eq!(def.kind, ColumnKind::Decimal { places: 2 });
    }

    #[test]
    fn test_decimal_without_places_is_plain_number() {
        let ft: FieldType = serde_json::from_value(json!({ "type": "decimal" })).unwrap();
        let def = ColumnDef::resolve("v", &ft);
        assert_eq!(def.kind, ColumnKind::Number);
    }

    #[test]
    fn test_unrecognized_passes_through() {
        let def = ColumnDef::resolve("blob", &FieldType::Tag("geo/latlong".into()));
        assert_eq!(def.kind, ColumnKind::Text);
        assert_eq!(render(&def, json!("41.2,2.1")), "41.2,2.1");
    }

    #[test]
    fn test_render_numeric_kinds() {
        let number = ColumnDef::resolve("n", &FieldType::Tag("number/plain".into()));
        assert_eq!(render(&number, json!(5001)), "5,001");
        assert_eq!(render(&number, json!(null)), "N/A");

        let size = ColumnDef::resolve("s", &FieldType::Tag("number/size".into()));
        assert_eq!(render(&size, json!(1536)), "1.5K");

        let pct: FieldType =
            serde_json::from_value(json!({ "type": "number/percent", "places": 1 })).unwrap();
        let pct = ColumnDef::resolve("p", &pct);
        assert_eq!(render(&pct, json!(0.125)), "12.5%");
    }

    #[test]
    fn test_render_datetime() {
        let ft: FieldType = serde_json::from_value(json!({
            "type": "datetime",
            "format": "%Y-%m-%d %H:%M:%S",
            "showas": "short"
        }))
        .unwrap();
        let def = ColumnDef::resolve("t", &ft);
        assert_eq!(render(&def, json!("2020-01-15 15:04:05")), "1/15/2020, 3:04:05 PM");
        // unparseable values pass through
        assert_eq!(render(&def, json!("whenever")), "whenever");
    }

    #[test]
    fn test_render_timespan_converts_seconds() {
        let ft: FieldType =
            serde_json::from_value(json!({ "type": "time/span", "unit": "s" })).unwrap();
        let def = ColumnDef::resolve("elapsed", &ft);
        assert_eq!(render(&def, json!(90)), "1m 30s");
    }

    #[test]
    fn test_merge_formatter_takes_precedence() {
        let mut def = ColumnDef::resolve("n", &FieldType::Tag("number/plain".into()));
        def.merge_formatter = Some(Arc::new(|v, key, _row| format!("{key}={v}")));
        assert_eq!(render(&def, json!(7)), "n=7");
    }
}
