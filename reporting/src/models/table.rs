//! Table model built from compact server payloads.
//!
//! The server sends rows as arrays of values positionally matched to a
//! `fields` list, which is much smaller on the wire than repeating keys
//! per row. Construction materializes those into key/value rows and
//! resolves each column's type descriptor once.

use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::api::TablePayload;
use crate::models::column::{ColumnDef, FieldType, MergeFormatter};

/// Structural failures signal a caller/integration bug, not a condition
/// to recover from.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("table payload is missing required part '{0}'")]
    MissingPart(&'static str),
    #[error("row {row} has {actual} values for {expected} fields")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("field list and field type list differ in length ({fields} vs {types})")]
    FieldTypeCount { fields: usize, types: usize },
}

/// One materialized row plus presentation annotations computed post hoc.
#[derive(Debug, Clone, Default)]
pub struct TableRow {
    pub cells: Map<String, Value>,
    /// Set when any cell matched a bad-outcome predicate.
    pub flagged: bool,
    /// Keys of the cells that matched, for per-cell highlighting.
    pub flagged_cells: Vec<String>,
    /// Alternating band for rows sharing a logical group; `None` when
    /// the row is in no visible group.
    pub group_band: Option<bool>,
}

impl TableRow {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.cells.get(key)
    }

    /// String form of a cell; `None` for missing, null, or non-string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.cells.get(key).and_then(Value::as_str)
    }
}

/// Rows, active column definitions in display order, and a stash of
/// removed columns kept for potential reattachment.
#[derive(Debug, Clone, Default)]
pub struct ReportTable {
    pub rows: Vec<TableRow>,
    pub columns: Vec<ColumnDef>,
    stashed: HashMap<String, ColumnDef>,
}

impl ReportTable {
    /// Validate and materialize a server payload. `items`, `fields`, and
    /// `field_types` must all be present.
    pub fn from_payload(payload: TablePayload) -> Result<Self, TableError> {
        let mut items = payload.items.ok_or(TableError::MissingPart("items"))?;
        let fields = payload.fields.ok_or(TableError::MissingPart("fields"))?;
        let field_types = payload
            .field_types
            .ok_or(TableError::MissingPart("field_types"))?;
        if fields.len() != field_types.len() {
            return Err(TableError::FieldTypeCount {
                fields: fields.len(),
                types: field_types.len(),
            });
        }

        Self::materialize_rows(&mut items, &fields)?;
        let rows = items
            .into_iter()
            .map(|item| match item {
                Value::Object(cells) => TableRow {
                    cells,
                    ..TableRow::default()
                },
                // materialize_rows leaves only objects behind
                _ => TableRow::default(),
            })
            .collect::<Vec<_>>();

        let columns = fields
            .iter()
            .zip(field_types.iter())
            .map(|(key, ft)| ColumnDef::resolve(key, ft))
            .collect::<Vec<_>>();

        debug!(rows = rows.len(), columns = columns.len(), "table constructed");
        Ok(Self {
            rows,
            columns,
            stashed: HashMap::new(),
        })
    }

    /// Convert compact array rows to key/value objects in place.
    /// Idempotent: already-converted rows (first item not an array) are
    /// left alone.
    pub fn materialize_rows(items: &mut [Value], fields: &[String]) -> Result<(), TableError> {
        if items.first().map(Value::is_array) != Some(true) {
            return Ok(());
        }
        for (idx, item) in items.iter_mut().enumerate() {
            let Value::Array(values) = item.take() else {
                continue;
            };
            if values.len() != fields.len() {
                return Err(TableError::RowWidth {
                    row: idx,
                    expected: fields.len(),
                    actual: values.len(),
                });
            }
            let cells: Map<String, Value> = fields.iter().cloned().zip(values).collect();
            *item = Value::Object(cells);
        }
        Ok(())
    }

    pub fn column_index_of(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.key == key)
    }

    /// Look up a column by key. With `only_active` the stash of removed
    /// columns is not consulted.
    pub fn column(&self, key: &str, only_active: bool) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.key == key)
            .or_else(|| if only_active { None } else { self.stashed.get(key) })
    }

    /// Remove `sources` from the active column list, stashing them for
    /// possible reuse, and when `target` is given install `formatter` as
    /// its display formatter. Used to fold low-value columns (raw ids,
    /// reason codes) into one human-readable cell without discarding the
    /// underlying data.
    pub fn combine_columns(
        &mut self,
        sources: &[&str],
        target: Option<&str>,
        formatter: Option<MergeFormatter>,
    ) {
        for source in sources {
            if let Some(idx) = self.column_index_of(source) {
                let removed = self.columns.remove(idx);
                self.stashed.insert(removed.key.clone(), removed);
            }
        }
        if let (Some(target), Some(formatter)) = (target, formatter) {
            if let Some(idx) = self.column_index_of(target) {
                self.columns[idx].merge_formatter = Some(formatter);
            }
        }
    }

    /// Assign alternating group bands. Rows with the same group key get
    /// the same band; the band flips when the key changes; rows for
    /// which `group_fn` returns `None` are skipped (not part of any
    /// visible group).
    pub fn apply_row_grouping<F>(&mut self, group_fn: F)
    where
        F: Fn(&TableRow, usize) -> Option<String>,
    {
        let mut last_group: Option<String> = None;
        let mut count: u64 = 0;
        for idx in 0..self.rows.len() {
            let Some(group) = group_fn(&self.rows[idx], idx) else {
                continue;
            };
            if last_group.as_deref() != Some(group.as_str()) {
                count += 1;
                last_group = Some(group);
            }
            self.rows[idx].group_band = Some(count % 2 == 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn payload() -> TablePayload {
        TablePayload {
            y: Some("top senders".to_string()),
            items: Some(vec![
                json!(["alice", 10.6, 200, "top-10"]),
                json!(["bob", 3.5, 50, "top-10"]),
            ]),
            fields: Some(
                ["name", "x", "y", "label"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
            field_types: Some(vec![
                FieldType::Tag("text/plain".into()),
                FieldType::Tag("number/plain".into()),
                FieldType::Tag("number/size".into()),
                FieldType::Tag("text/plain".into()),
            ]),
        }
    }

    #[test]
    fn test_from_payload_materializes_rows() {
        let table = ReportTable::from_payload(payload()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get_str("name"), Some("alice"));
        assert_eq!(table.rows[0].get("x"), Some(&json!(10.6)));
        assert_eq!(table.rows[1].get("y"), Some(&json!(50)));
        assert_eq!(table.columns.len(), 4);
    }

    #[test]
    fn test_missing_parts_fail_fast() {
        let mut p = payload();
        p.field_types = None;
        assert!(matches!(
            ReportTable::from_payload(p),
            Err(TableError::MissingPart("field_types"))
        ));
        let mut p = payload();
        p.items = None;
        assert!(matches!(
            ReportTable::from_payload(p),
            Err(TableError::MissingPart("items"))
        ));
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let fields: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let mut items = vec![json!([1, "x", true])];
        ReportTable::materialize_rows(&mut items, &fields).unwrap();
        assert_eq!(items[0], json!({"a": 1, "b": "x", "c": true}));
        let before = items.clone();
        ReportTable::materialize_rows(&mut items, &fields).unwrap();
        assert_eq!(items, before);
    }

    #[test]
    fn test_materialize_rejects_short_rows() {
        let fields: Vec<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let mut items = vec![json!([1])];
        assert!(matches!(
            ReportTable::materialize_rows(&mut items, &fields),
            Err(TableError::RowWidth { row: 0, .. })
        ));
    }

    #[test]
    fn test_combine_columns_removes_and_installs_formatter() {
        let mut table = ReportTable::from_payload(payload()).unwrap();
        let fmt: MergeFormatter = Arc::new(|v, key, _row| format!("{key}:{v}"));
        table.combine_columns(&["x"], Some("y"), Some(fmt));

        assert!(table.column_index_of("x").is_none());
        // stashed column still reachable unless only_active
        assert!(table.column("x", false).is_some());
        assert!(table.column("x", true).is_none());

        let y = table.column("y", true).unwrap();
        let rendered = y.render(
            table.rows[0].get("y").unwrap(),
            &table.rows[0],
            &crate::format::NumberFormat::en(),
            &chrono::Utc,
        );
        assert_eq!(rendered, "y:200");
    }

    #[test]
    fn test_combine_without_target_just_removes() {
        let mut table = ReportTable::from_payload(payload()).unwrap();
        table.combine_columns(&["x", "label"], None, None);
        assert_eq!(table.columns.len(), 2);
    }

    #[test]
    fn test_row_grouping_bands() {
        let mut table = ReportTable::from_payload(TablePayload {
            y: None,
            items: Some(vec![
                json!(["m1", "a@x"]),
                json!(["m1", "b@x"]),
                json!(["m2", "c@x"]),
                json!(["m3", "d@x"]),
            ]),
            fields: Some(vec!["msg".to_string(), "rcpt".to_string()]),
            field_types: Some(vec![
                FieldType::Tag("text/plain".into()),
                FieldType::Tag("text/email".into()),
            ]),
        })
        .unwrap();

        table.apply_row_grouping(|row, _| row.get_str("msg").map(String::from));
        let bands: Vec<_> = table.rows.iter().map(|r| r.group_band).collect();
        assert_eq!(bands[0], bands[1]);
        assert_ne!(bands[1], bands[2]);
        assert_ne!(bands[2], bands[3]);
    }

    #[test]
    fn test_row_grouping_skips_hidden_rows() {
        let mut table = ReportTable::from_payload(payload()).unwrap();
        table.apply_row_grouping(|row, _| {
            row.get_str("name").filter(|n| *n != "bob").map(String::from)
        });
        assert!(table.rows[0].group_band.is_some());
        assert!(table.rows[1].group_band.is_none());
    }
}
