//! "Flagged connections" panel: rejected and suspicious inbound
//! connection activity.

use chrono::TimeZone;

use crate::api::{FlaggedConnectionsResponse, PieDatum};
use crate::models::mail::disposition_short_desc;
use crate::models::table::ReportTable;
use crate::models::time::DateRangeSelection;
use crate::models::timeseries::TimeseriesData;
use crate::panels::page::ReportsPage;
use crate::panels::state::{LoadState, PanelCore};
use crate::panels::PanelError;

pub struct FlaggedConnectionsModels {
    /// Failed login attempts over time.
    pub failed_login: TimeseriesData,
    /// Suspected scanner connections over time.
    pub suspected_scanner: TimeseriesData,
    /// Raw disposition tags; rendered through [`Self::disposition_pie`].
    pub connections_by_disposition: Vec<PieDatum>,
    pub reject_by_failure_category: Vec<PieDatum>,
    pub top_hosts_rejected: ReportTable,
    pub insecure_inbound: ReportTable,
    pub insecure_outbound: ReportTable,
}

impl FlaggedConnectionsModels {
    /// Disposition pie data with the tags replaced by their
    /// human-readable descriptions.
    pub fn disposition_pie(&self) -> Vec<PieDatum> {
        self.connections_by_disposition
            .iter()
            .map(|d| PieDatum {
                name: disposition_short_desc(&d.name),
                value: d.value,
            })
            .collect()
    }
}

#[derive(Default)]
pub struct FlaggedConnectionsPanel {
    core: PanelCore<DateRangeSelection>,
    models: Option<FlaggedConnectionsModels>,
}

impl FlaggedConnectionsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoadState {
        self.core.state()
    }

    pub fn models(&self) -> Option<&FlaggedConnectionsModels> {
        self.models.as_ref()
    }

    pub async fn activate<Tz: TimeZone>(&mut self, page: &ReportsPage<Tz>) -> Result<(), PanelError> {
        let selection = *page.selection();
        let query = page.timeseries_query()?;
        let Some(generation) = self.core.begin(selection) else {
            return Ok(());
        };
        match page.backend().flagged_connections(&query).await {
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

fn build_models(
    response: FlaggedConnectionsResponse,
) -> Result<FlaggedConnectionsModels, PanelError> {
    let flagged = TimeseriesData::from_payload(response.flagged)?;
    Ok(FlaggedConnectionsModels {
        failed_login: flagged.subseries(&["failed_login_attempt"]),
        suspected_scanner: flagged.subseries(&["suspected_scanner"]),
        connections_by_disposition: response.connections_by_disposition,
        reject_by_failure_category: response.reject_by_failure_category,
        top_hosts_rejected: ReportTable::from_payload(response.top_hosts_rejected)?,
        insecure_inbound: ReportTable::from_payload(response.insecure_inbound)?,
        insecure_outbound: ReportTable::from_payload(response.insecure_outbound)?,
    })
}
