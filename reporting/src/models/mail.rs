//! Mail-specific table behavior: bad-outcome row flagging and
//! connection-disposition descriptions.

use std::ops::{Deref, DerefMut};

use serde_json::Value;

use crate::models::table::{ReportTable, TableRow};

/// Human-readable description of a connection disposition tag. Unknown
/// tags fall back to underscore-to-space.
pub fn disposition_short_desc(disposition: &str) -> String {
    match disposition {
        "failed_login_attempt" => "failed login attempt".to_string(),
        "insecure" => "insecure connection".to_string(),
        "ok" => "normal, secure connection".to_string(),
        "reject" => "mail attempt rejected".to_string(),
        "suspected_scanner" => "suspected scanner".to_string(),
        other => other.replace('_', " "),
    }
}

/// A [`ReportTable`] over mail delivery rows, adding domain predicates
/// that mark notable/abnormal outcomes for highlighting and the
/// "flagged only" filter.
#[derive(Debug, Clone, Default)]
pub struct MailReportTable {
    table: ReportTable,
}

impl Deref for MailReportTable {
    type Target = ReportTable;
    fn deref(&self) -> &ReportTable {
        &self.table
    }
}

impl DerefMut for MailReportTable {
    fn deref_mut(&mut self) -> &mut ReportTable {
        &mut self.table
    }
}

impl From<ReportTable> for MailReportTable {
    fn from(table: ReportTable) -> Self {
        Self { table }
    }
}

impl MailReportTable {
    pub fn into_inner(self) -> ReportTable {
        self.table
    }

    /// Scan the known verdict columns against bad-outcome predicates and
    /// mark matching rows. Only currently-active columns participate, so
    /// a combined-away column stops flagging.
    pub fn apply_row_flags(&mut self) {
        self.flag("accept_status", |v, _row| v.as_str() == Some("reject"));
        // the relay cell is highlighted, the predicate reads the
        // connection trust level
        self.flag("relay", |_v, row| {
            row.get_str("delivery_connection") == Some("untrusted")
        });
        self.flag("status", |v, _row| v.as_str() != Some("sent"));
        self.flag("spam_result", |v, row| {
            present(row, "spam_result") && v.as_str() != Some("clean")
        });
        self.flag("spf_result", |v, _row| {
            matches!(v.as_str(), Some("Fail") | Some("Softfail"))
        });
        self.flag("dkim_result", |v, row| {
            present(row, "dkim_result") && v.as_str() != Some("pass")
        });
        self.flag("dmarc_result", |v, _row| v.as_str() == Some("fail"));
        self.flag("postgrey_result", |v, row| {
            present(row, "postgrey_result") && v.as_str() != Some("pass")
        });
        self.flag("disposition", |_v, row| {
            row.get_str("disposition") != Some("ok")
        });
    }

    /// Mark every row whose `key` cell satisfies `predicate`, recording
    /// the cell key for per-cell highlighting. No-op when the column is
    /// not active.
    pub fn flag<F>(&mut self, key: &str, predicate: F)
    where
        F: Fn(&Value, &TableRow) -> bool,
    {
        if self.table.column(key, true).is_none() {
            return;
        }
        for row in &mut self.table.rows {
            let Some(value) = row.cells.get(key) else {
                continue;
            };
            if predicate(value, row) {
                row.flagged = true;
                if !row.flagged_cells.iter().any(|k| k == key) {
                    row.flagged_cells.push(key.to_string());
                }
            }
        }
    }
}

fn present(row: &TableRow, key: &str) -> bool {
    matches!(row.get_str(key), Some(s) if !s.is_empty())
}
