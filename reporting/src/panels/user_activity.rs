//! "User activity" drill-down panel: per-user sent mail, received mail,
//! and IMAP connection summary, with a further drill-down into IMAP
//! connection details.
//!
//! The raw tables carry many low-value columns (ids, reason codes,
//! connection internals). They are folded into the human-facing cells
//! with merge formatters rather than dropped, so the underlying data
//! stays reachable through the column stash.

use std::sync::Arc;

use chrono::TimeZone;
use tracing::warn;

use crate::api::{ImapDetailsQuery, UserActivityQuery, UserActivityResponse};
use crate::models::column::{plain_text, MergeFormatter};
use crate::models::mail::MailReportTable;
use crate::models::table::{ReportTable, TableRow};
use crate::models::time::DateRangeSelection;
use crate::panels::page::ReportsPage;
use crate::panels::route::RouteQuery;
use crate::panels::state::{LoadState, PanelCore};
use crate::panels::PanelError;

/// Recent-list category for drilled-down users.
const RECENT_USERS: &str = "user_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserActivitySelection {
    pub user_id: String,
    pub range: DateRangeSelection,
    pub row_limit: u32,
}

/// Identifies one IMAP-details drill-down within a loaded selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImapDetailSelection {
    pub parent: UserActivitySelection,
    pub disposition: String,
    pub remote_host: String,
}

pub struct UserActivityModels {
    pub sent_mail: MailReportTable,
    pub received_mail: MailReportTable,
    pub imap_conn_summary: MailReportTable,
}

#[derive(Default)]
pub struct UserActivityPanel {
    core: PanelCore<UserActivitySelection>,
    models: Option<UserActivityModels>,
    imap_core: PanelCore<ImapDetailSelection>,
    imap_details: Option<MailReportTable>,
    flagged_only: bool,
    tab: Option<String>,
    user_list: Option<Vec<String>>,
}

impl UserActivityPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoadState {
        self.core.state()
    }

    pub fn models(&self) -> Option<&UserActivityModels> {
        self.models.as_ref()
    }

    pub fn selected_user(&self) -> Option<&str> {
        self.core.loaded().map(|s| s.user_id.as_str())
    }

    pub fn flagged_only(&self) -> bool {
        self.flagged_only
    }

    /// Toggle the "show flagged rows only" filter and recompute the
    /// group bands over the visible rows.
    pub fn set_flagged_only(&mut self, flagged_only: bool) {
        self.flagged_only = flagged_only;
        self.regroup();
    }

    /// Whether a row survives the flagged-only filter.
    pub fn is_row_visible(&self, row: &TableRow) -> bool {
        !self.flagged_only || row.flagged
    }

    pub fn tab(&self) -> Option<&str> {
        self.tab.as_deref()
    }

    pub fn set_tab(&mut self, tab: Option<String>) {
        self.tab = tab;
    }

    /// Mirror the loaded user and active tab into the route query.
    pub fn write_route(&self, route: &mut RouteQuery) {
        route.user = self.core.loaded().map(|s| s.user_id.clone());
        route.tab = self.tab.clone();
    }

    /// The account list for the user picker, fetched once per panel
    /// lifetime.
    pub async fn user_list<Tz: TimeZone>(
        &mut self,
        page: &ReportsPage<Tz>,
    ) -> Result<&[String], PanelError> {
        if self.user_list.is_none() {
            self.user_list = Some(page.backend().user_list().await?);
        }
        Ok(self.user_list.as_deref().unwrap_or_default())
    }

    /// Recently drilled-down users, newest first.
    pub fn recent_users<Tz: TimeZone>(&self, page: &ReportsPage<Tz>) -> Vec<String> {
        page.settings().recent_list(RECENT_USERS)
    }

    /// Fetch and rebuild the three tables for `user_id` over the page's
    /// current range. A successful load records the user in the recent
    /// list and drops any open IMAP drill-down.
    pub async fn activate<Tz: TimeZone>(
        &mut self,
        page: &ReportsPage<Tz>,
        user_id: &str,
    ) -> Result<(), PanelError> {
        let selection = UserActivitySelection {
            user_id: user_id.to_string(),
            range: *page.selection(),
            row_limit: page.settings().row_limit(),
        };
        let (start_date, end_date) = page.utc_range()?.wire();
        let query = UserActivityQuery {
            user_id: selection.user_id.clone(),
            start_date,
            end_date,
            row_limit: selection.row_limit,
        };
        let Some(generation) = self.core.begin(selection) else {
            return Ok(());
        };
        match page.backend().user_activity(&query).await {
            Ok(response) => match build_models(response, user_id) {
                Ok(models) => {
                    if self.core.complete(generation) {
                        self.models = Some(models);
                        self.imap_core = PanelCore::new();
                        self.imap_details = None;
                        self.regroup();
                        if let Err(e) = page.settings().add_to_recent_list(RECENT_USERS, user_id) {
                            warn!(error = %e, "cannot update recent user list");
                        }
                    }
                    Ok(())
                }
                Err(e) => {
                    self.core.fail(generation);
                    Err(e)
                }
            },
            Err(e) => {
                if self.core.fail(generation) {
                    Err(e.into())
                } else {
                    Ok(())
                }
            }
        }
    }

    pub fn imap_state(&self) -> LoadState {
        self.imap_core.state()
    }

    pub fn imap_details(&self) -> Option<&MailReportTable> {
        self.imap_details.as_ref()
    }

    /// Drill further into the IMAP connections behind one summary row.
    /// Requires a loaded main selection.
    pub async fn open_imap_details<Tz: TimeZone>(
        &mut self,
        page: &ReportsPage<Tz>,
        disposition: &str,
        remote_host: &str,
    ) -> Result<(), PanelError> {
        let Some(parent) = self.core.loaded().cloned() else {
            return Ok(());
        };
        let (start_date, end_date) = parent.range.utc_range_in(page.timezone())?.wire();
        let query = ImapDetailsQuery {
            user_id: parent.user_id.clone(),
            start_date,
            end_date,
            row_limit: parent.row_limit,
            disposition: disposition.to_string(),
            remote_host: remote_host.to_string(),
        };
        let selection = ImapDetailSelection {
            parent,
            disposition: disposition.to_string(),
            remote_host: remote_host.to_string(),
        };
        let Some(generation) = self.imap_core.begin(selection) else {
            return Ok(());
        };
        match page.backend().imap_details(&query).await {
            Ok(response) => {
                match ReportTable::from_payload(response.imap_details) {
                    Ok(table) => {
                        let mut table = MailReportTable::from(table);
                        // the drill-down is already scoped to these
                        table.combine_columns(&["remote_host", "disposition"], None, None);
                        table.apply_row_flags();
                        if self.imap_core.complete(generation) {
                            self.imap_details = Some(table);
                        }
                        Ok(())
                    }
                    Err(e) => {
                        self.imap_core.fail(generation);
                        Err(e.into())
                    }
                }
            }
            Err(e) => {
                if self.imap_core.fail(generation) {
                    Err(e.into())
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Recompute the alternating bands over rows sharing a sent_id,
    /// skipping rows the flagged-only filter hides.
    fn regroup(&mut self) {
        let Some(models) = &mut self.models else {
            return;
        };
        let flagged_only = self.flagged_only;
        for row in &mut models.sent_mail.rows {
            row.group_band = None;
        }
        models.sent_mail.apply_row_grouping(|row, _| {
            if flagged_only && !row.flagged {
                return None;
            }
            row.get_str("sent_id").map(String::from)
        });
    }
}

fn build_models(
    response: UserActivityResponse,
    user_id: &str,
) -> Result<UserActivityModels, PanelError> {
    Ok(UserActivityModels {
        sent_mail: build_sent_mail(response.sent_mail, user_id)?,
        received_mail: build_received_mail(response.received_mail)?,
        imap_conn_summary: build_imap_summary(response.imap_conn_summary)?,
    })
}

fn build_sent_mail(
    payload: crate::api::TablePayload,
    user_id: &str,
) -> Result<MailReportTable, PanelError> {
    let mut table = MailReportTable::from(ReportTable::from_payload(payload)?);
    table.combine_columns(
        &["sent_id", "spam_score", "delivery_info", "delivery_connection_info"],
        None,
        None,
    );

    // recipients sent on behalf of another address show the real sender
    let user = user_id.to_string();
    let rcpt: MergeFormatter = Arc::new(move |value, _key, row| {
        let text = plain_text(value);
        match row.get_str("envelope_from") {
            Some(from) if !from.is_empty() && from != user => format!("{text} (FROM: {from})"),
            _ => text,
        }
    });
    table.combine_columns(&["envelope_from"], Some("rcpt_to"), Some(rcpt));

    // local (lmtp) deliveries show no relay; others show the relay host
    // with the connection trust appended when it is not clean
    let relay: MergeFormatter = Arc::new(|value, _key, row| {
        if row.get_str("service") == Some("lmtp") {
            return String::new();
        }
        let text = plain_text(value);
        let host = text.split('[').next().unwrap_or("").trim().to_string();
        match row.get_str("delivery_connection") {
            Some(conn) if !conn.is_empty() && conn != "trusted" && conn != "verified" => {
                format!("{host}: {conn}")
            }
            _ => host,
        }
    });
    table.combine_columns(&["delivery_connection"], Some("relay"), Some(relay));

    table.apply_row_flags();
    Ok(table)
}

fn build_received_mail(payload: crate::api::TablePayload) -> Result<MailReportTable, PanelError> {
    let mut table = MailReportTable::from(ReportTable::from_payload(payload)?);
    table.combine_columns(
        &[
            "remote_host",
            "remote_ip",
            "dkim_reason",
            "dmarc_reason",
            "failure_info",
            "postgrey_reason",
            "postgrey_delay",
            "spam_score",
            "orig_to",
            "message_id",
            "lmtp_id",
        ],
        None,
        None,
    );

    // an authenticated submitter differing from the envelope sender is
    // worth seeing inline
    let from: MergeFormatter = Arc::new(|value, _key, row| {
        let text = plain_text(value);
        match row.get_str("sasl_username") {
            Some(sasl) if !sasl.is_empty() && sasl != text => format!("{text} ({sasl})"),
            _ => text,
        }
    });
    table.combine_columns(&["sasl_username"], Some("envelope_from"), Some(from));
    if let Some(idx) = table.column_index_of("envelope_from") {
        table.columns[idx].label = Some("Envelope From (user)".to_string());
    }

    table.apply_row_flags();
    Ok(table)
}

fn build_imap_summary(payload: crate::api::TablePayload) -> Result<MailReportTable, PanelError> {
    let mut table = MailReportTable::from(ReportTable::from_payload(payload)?);
    table.combine_columns(&["first_connection_time"], None, None);
    // the count column needs no header over a one-user summary
    if let Some(idx) = table.column_index_of("total") {
        table.columns[idx].label = Some(String::new());
    }
    table.apply_row_flags();
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ImapDetailsResponse, TablePayload};
    use crate::backend::MemoryBackend;
    use crate::format::NumberFormat;
    use crate::models::time::RangeType;
    use crate::settings::{MemoryStore, SettingsService};
    use chrono::{NaiveDate, Utc};
    use serde_json::json;

    fn sent_mail_payload() -> TablePayload {
        serde_json::from_value(json!({
            "items": [
                ["s1", "alice@example.com", "bob@remote.net",
                 "mx.remote.net [10.0.0.1]", "untrusted", "smtp", "sent"],
                ["s1", "alice@example.com", "carol@remote.net",
                 "mx.remote.net [10.0.0.1]", "trusted", "smtp", "sent"],
                ["s2", "list@example.com", "dave@remote.net",
                 "", "", "lmtp", "deferred"]
            ],
            "fields": ["sent_id", "envelope_from", "rcpt_to", "relay",
                       "delivery_connection", "service", "status"],
            "field_types": ["text/plain", "text/email", "text/email",
                            "text/plain", "text/plain", "text/plain", "text/plain"]
        }))
        .unwrap()
    }

    fn received_mail_payload() -> TablePayload {
        serde_json::from_value(json!({
            "items": [
                ["ext@remote.net", "", "Pass"],
                ["alice@example.com", "alice-auth@example.com", "Fail"]
            ],
            "fields": ["envelope_from", "sasl_username", "spf_result"],
            "field_types": ["text/email", "text/email", "text/plain"]
        }))
        .unwrap()
    }

    fn imap_summary_payload() -> TablePayload {
        serde_json::from_value(json!({
            "items": [["imap.example.net", "ok", 4, "2024-03-01 08:00:00"]],
            "fields": ["remote_host", "disposition", "total", "first_connection_time"],
            "field_types": ["text/plain", "text/plain", "number/plain", "text/plain"]
        }))
        .unwrap()
    }

    fn response() -> UserActivityResponse {
        UserActivityResponse {
            sent_mail: sent_mail_payload(),
            received_mail: received_mail_payload(),
            imap_conn_summary: imap_summary_payload(),
        }
    }

    fn page(backend: std::sync::Arc<MemoryBackend>) -> ReportsPage<Utc> {
        let settings = SettingsService::load(std::sync::Arc::new(MemoryStore::new())).unwrap();
        ReportsPage::new(
            backend,
            settings,
            Utc,
            RangeType::LastDays(30),
            NaiveDate::from_ymd_opt(2024, 3, 30).unwrap(),
        )
    }

    fn render(table: &MailReportTable, key: &str, row: usize) -> String {
        let col = table.column(key, true).unwrap();
        let r = &table.rows[row];
        col.render(r.get(key).unwrap(), r, &NumberFormat::en(), &Utc)
    }

    #[tokio::test]
    async fn test_activation_combines_columns() {
        let backend = std::sync::Arc::new(MemoryBackend::new());
        backend.set_user_activity(response());
        let page = page(backend);

        let mut panel = UserActivityPanel::new();
        panel.activate(&page, "alice@example.com").await.unwrap();
        assert_eq!(panel.state(), LoadState::Loaded);

        let models = panel.models().unwrap();
        // folded-away columns leave the active list but stay stashed
        assert!(models.sent_mail.column("sent_id", true).is_none());
        assert!(models.sent_mail.column("sent_id", false).is_some());
        assert!(models.received_mail.column("sasl_username", true).is_none());
        assert_eq!(
            models.received_mail.column("envelope_from", true).unwrap().display_label(),
            "Envelope From (user)"
        );
        assert_eq!(
            models.imap_conn_summary.column("total", true).unwrap().display_label(),
            ""
        );
    }

    #[tokio::test]
    async fn test_merge_formatters() {
        let backend = std::sync::Arc::new(MemoryBackend::new());
        backend.set_user_activity(response());
        let page = page(backend);

        let mut panel = UserActivityPanel::new();
        panel.activate(&page, "alice@example.com").await.unwrap();
        let models = panel.models().unwrap();

        // own mail: recipient only; foreign envelope sender is appended
        assert_eq!(render(&models.sent_mail, "rcpt_to", 0), "bob@remote.net");
        assert_eq!(
            render(&models.sent_mail, "rcpt_to", 2),
            "dave@remote.net (FROM: list@example.com)"
        );

        // relay host is trimmed at the bracketed address; untrusted
        // connections are annotated; lmtp shows nothing
        assert_eq!(render(&models.sent_mail, "relay", 0), "mx.remote.net: untrusted");
        assert_eq!(render(&models.sent_mail, "relay", 1), "mx.remote.net");
        assert_eq!(render(&models.sent_mail, "relay", 2), "");

        // differing sasl submitter shown next to the envelope sender
        assert_eq!(render(&models.received_mail, "envelope_from", 0), "ext@remote.net");
        assert_eq!(
            render(&models.received_mail, "envelope_from", 1),
            "alice@example.com (alice-auth@example.com)"
        );
    }

    #[tokio::test]
    async fn test_flagged_only_regroups() {
        let backend = std::sync::Arc::new(MemoryBackend::new());
        backend.set_user_activity(response());
        let page = page(backend);

        let mut panel = UserActivityPanel::new();
        panel.activate(&page, "alice@example.com").await.unwrap();

        {
            let rows = &panel.models().unwrap().sent_mail.rows;
            // two s1 rows share a band, s2 differs
            assert_eq!(rows[0].group_band, rows[1].group_band);
            assert_ne!(rows[1].group_band, rows[2].group_band);
        }

        panel.set_flagged_only(true);
        let rows = &panel.models().unwrap().sent_mail.rows;
        // row 1 (clean) is hidden and carries no band
        assert!(rows[0].flagged);
        assert!(!rows[1].flagged);
        assert!(rows[1].group_band.is_none());
        assert!(rows[0].group_band.is_some());
        assert!(!panel.is_row_visible(&rows[1]));
    }

    #[tokio::test]
    async fn test_recent_users_and_route() {
        let backend = std::sync::Arc::new(MemoryBackend::new());
        backend.set_user_activity(response());
        let page = page(backend);

        let mut panel = UserActivityPanel::new();
        panel.activate(&page, "alice@example.com").await.unwrap();
        assert_eq!(panel.recent_users(&page), vec!["alice@example.com"]);

        panel.set_tab(Some("imap".to_string()));
        let mut route = RouteQuery::default();
        panel.write_route(&mut route);
        assert_eq!(route.user.as_deref(), Some("alice@example.com"));
        assert_eq!(route.tab.as_deref(), Some("imap"));
    }

    #[tokio::test]
    async fn test_imap_drill_down() {
        let backend = std::sync::Arc::new(MemoryBackend::new());
        backend.set_user_activity(response());
        backend.set_imap_details(ImapDetailsResponse {
            imap_details: serde_json::from_value(json!({
                "items": [["imap.example.net", "ok", "2024-03-01 08:00:00"]],
                "fields": ["remote_host", "disposition", "connect_time"],
                "field_types": ["text/plain", "text/plain", "text/plain"]
            }))
            .unwrap(),
        });
        let page = page(backend);

        let mut panel = UserActivityPanel::new();
        // no loaded selection yet: drill-down is a no-op
        panel.open_imap_details(&page, "ok", "imap.example.net").await.unwrap();
        assert!(panel.imap_details().is_none());

        panel.activate(&page, "alice@example.com").await.unwrap();
        panel.open_imap_details(&page, "ok", "imap.example.net").await.unwrap();
        let details = panel.imap_details().unwrap();
        assert!(details.column("remote_host", true).is_none());
        assert!(details.column("disposition", true).is_none());
        assert_eq!(details.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_user_list_cached() {
        let backend = std::sync::Arc::new(MemoryBackend::new());
        backend.set_user_list(vec!["alice@example.com".to_string()]);
        let page = page(backend.clone());

        let mut panel = UserActivityPanel::new();
        assert_eq!(panel.user_list(&page).await.unwrap().len(), 1);
        panel.user_list(&page).await.unwrap();
        assert_eq!(backend.calls(), vec!["user-list"]);
    }
}
