//! "Messages sent" panel: outbound volume over time plus the top-sender
//! tables.

use chrono::TimeZone;

use crate::api::MessagesSentResponse;
use crate::models::table::ReportTable;
use crate::models::time::DateRangeSelection;
use crate::models::timeseries::TimeseriesData;
use crate::panels::page::ReportsPage;
use crate::panels::state::{LoadState, PanelCore};
use crate::panels::PanelError;

/// Chart and table models derived from one response.
pub struct MessagesSentModels {
    /// Total messages sent, for the headline line chart.
    pub sent: TimeseriesData,
    /// Local vs remote destination split, for the stacked-bar chart.
    pub by_destination: TimeseriesData,
    pub top_senders_by_count: ReportTable,
    pub top_senders_by_size: ReportTable,
}

#[derive(Default)]
pub struct MessagesSentPanel {
    core: PanelCore<DateRangeSelection>,
    models: Option<MessagesSentModels>,
}

impl MessagesSentPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoadState {
        self.core.state()
    }

    /// Models from the most recent successful load; retained across
    /// failures.
    pub fn models(&self) -> Option<&MessagesSentModels> {
        self.models.as_ref()
    }

    /// Fetch and rebuild models for the page's current selection. A
    /// no-op when that selection is already loaded.
    pub async fn activate<Tz: TimeZone>(&mut self, page: &ReportsPage<Tz>) -> Result<(), PanelError> {
        let selection = *page.selection();
        let query = page.timeseries_query()?;
        let Some(generation) = self.core.begin(selection) else {
            return Ok(());
        };
        match page.backend().messages_sent(&query).await {
            Ok(response) => match build_models(response) {
                Ok(models) => {
                    if self.core.complete(generation) {
                        self.models = Some(models);
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
}

fn build_models(response: MessagesSentResponse) -> Result<MessagesSentModels, PanelError> {
    let ts = TimeseriesData::from_payload(response.ts_sent)?;
    Ok(MessagesSentModels {
        sent: ts.subseries(&["sent"]),
        by_destination: ts.subseries(&["local", "remote"]),
        top_senders_by_count: ReportTable::from_payload(response.top_senders_by_count)?,
        top_senders_by_size: ReportTable::from_payload(response.top_senders_by_size)?,
    })
}
