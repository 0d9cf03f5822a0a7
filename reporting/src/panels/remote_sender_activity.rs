//! "Remote sender activity" drill-down panel: all deliveries from one
//! external sender, selected either by envelope address or by sending
//! server.

use chrono::TimeZone;
use tracing::warn;

use crate::api::{
    RemoteSenderActivityQuery, RemoteSenderActivityResponse, SenderType, SuggestionsQuery,
    SuggestionsResponse,
};
use crate::models::mail::MailReportTable;
use crate::models::table::{ReportTable, TableRow};
use crate::models::time::DateRangeSelection;
use crate::panels::page::ReportsPage;
use crate::panels::route::RouteQuery;
use crate::panels::state::{LoadState, PanelCore};
use crate::panels::PanelError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSenderSelection {
    pub sender: String,
    pub sender_type: SenderType,
    pub range: DateRangeSelection,
    pub row_limit: u32,
}

/// Recent-list category for a sender type; addresses and servers keep
/// separate histories.
fn recent_category(sender_type: SenderType) -> &'static str {
    match sender_type {
        SenderType::EnvelopeFrom => "sender_email",
        SenderType::RemoteHost => "sender_server",
    }
}

/// Suggestion category understood by the select-list endpoint.
fn query_type(sender_type: SenderType) -> &'static str {
    match sender_type {
        SenderType::EnvelopeFrom => "envelope_from",
        SenderType::RemoteHost => "remote_host",
    }
}

#[derive(Default)]
pub struct RemoteSenderActivityPanel {
    core: PanelCore<RemoteSenderSelection>,
    activity: Option<MailReportTable>,
    flagged_only: bool,
}

impl RemoteSenderActivityPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoadState {
        self.core.state()
    }

    pub fn activity(&self) -> Option<&MailReportTable> {
        self.activity.as_ref()
    }

    pub fn selected_sender(&self) -> Option<(&str, SenderType)> {
        self.core.loaded().map(|s| (s.sender.as_str(), s.sender_type))
    }

    pub fn flagged_only(&self) -> bool {
        self.flagged_only
    }

    pub fn set_flagged_only(&mut self, flagged_only: bool) {
        self.flagged_only = flagged_only;
        self.regroup();
    }

    pub fn is_row_visible(&self, row: &TableRow) -> bool {
        !self.flagged_only || row.flagged
    }

    /// Mirror the loaded sender into the route query, under `email` or
    /// `server` depending on its type.
    pub fn write_route(&self, route: &mut RouteQuery) {
        route.email = None;
        route.server = None;
        if let Some(selection) = self.core.loaded() {
            match selection.sender_type {
                SenderType::EnvelopeFrom => route.email = Some(selection.sender.clone()),
                SenderType::RemoteHost => route.server = Some(selection.sender.clone()),
            }
        }
    }

    /// The sender a route query asks for, if any. `email` wins when both
    /// parameters are present.
    pub fn route_sender(route: &RouteQuery) -> Option<(String, SenderType)> {
        if let Some(email) = &route.email {
            return Some((email.clone(), SenderType::EnvelopeFrom));
        }
        route
            .server
            .as_ref()
            .map(|server| (server.clone(), SenderType::RemoteHost))
    }

    pub fn recent_senders<Tz: TimeZone>(
        &self,
        page: &ReportsPage<Tz>,
        sender_type: SenderType,
    ) -> Vec<String> {
        page.settings().recent_list(recent_category(sender_type))
    }

    /// Ask the server for senders matching a partial input, scoped to
    /// the page's current range. When the response is exact the caller
    /// normally activates the panel with the single match.
    pub async fn suggest<Tz: TimeZone>(
        &self,
        page: &ReportsPage<Tz>,
        sender_type: SenderType,
        input: &str,
    ) -> Result<SuggestionsResponse, PanelError> {
        let (start_date, end_date) = page.utc_range()?.wire();
        let query = SuggestionsQuery {
            query_type: query_type(sender_type).to_string(),
            query: input.to_string(),
            start_date: Some(start_date),
            end_date: Some(end_date),
        };
        Ok(page.backend().select_list_suggestions(&query).await?)
    }

    /// Fetch and rebuild the activity table for one sender over the
    /// page's current range.
    pub async fn activate<Tz: TimeZone>(
        &mut self,
        page: &ReportsPage<Tz>,
        sender: &str,
        sender_type: SenderType,
    ) -> Result<(), PanelError> {
        let selection = RemoteSenderSelection {
            sender: sender.to_string(),
            sender_type,
            range: *page.selection(),
            row_limit: page.settings().row_limit(),
        };
        let (start_date, end_date) = page.utc_range()?.wire();
        let query = RemoteSenderActivityQuery {
            sender: selection.sender.clone(),
            sender_type,
            start_date,
            end_date,
            row_limit: selection.row_limit,
        };
        let Some(generation) = self.core.begin(selection) else {
            return Ok(());
        };
        match page.backend().remote_sender_activity(&query).await {
            Ok(response) => match build_activity(response) {
                Ok(table) => {
                    if self.core.complete(generation) {
                        self.activity = Some(table);
                        self.regroup();
                        let category = recent_category(sender_type);
                        if let Err(e) = page.settings().add_to_recent_list(category, sender) {
                            warn!(error = %e, "cannot update recent sender list");
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

    fn regroup(&mut self) {
        let Some(table) = &mut self.activity else {
            return;
        };
        let flagged_only = self.flagged_only;
        for row in &mut table.rows {
            row.group_band = None;
        }
        table.apply_row_grouping(|row, _| {
            if flagged_only && !row.flagged {
                return None;
            }
            row.get_str("sent_id").map(String::from)
        });
    }
}

fn build_activity(response: RemoteSenderActivityResponse) -> Result<MailReportTable, PanelError> {
    let mut table = MailReportTable::from(ReportTable::from_payload(response.activity)?);
    table.combine_columns(
        &[
            "sent_id",
            "sasl_username",
            "spam_score",
            "dkim_reason",
            "dmarc_reason",
            "postgrey_reason",
            "postgrey_delay",
            "category",
            "failure_info",
        ],
        None,
        None,
    );
    table.apply_row_flags();
    Ok(table)
}
