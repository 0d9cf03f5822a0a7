//! Page-level controller shared by every panel.
//!
//! Owns the date-range selection, the display timezone, the settings
//! service, and the backend handle. Panels borrow the page to build
//! their queries, so the range and the derived bucket size are computed
//! in exactly one place.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::warn;

use crate::api::{CaptureDbStatsResponse, TimeseriesQuery};
use crate::backend::ReportsBackend;
use crate::format::parse_utc;
use crate::models::time::{DateRangeSelection, RangeType, UtcRange};
use crate::models::timeseries::TimeseriesData;
use crate::panels::route::RouteQuery;
use crate::panels::PanelError;
use crate::settings::SettingsService;

pub struct ReportsPage<Tz: TimeZone> {
    backend: Arc<dyn ReportsBackend>,
    settings: SettingsService,
    tz: Tz,
    selection: DateRangeSelection,
    db_stats: Option<CaptureDbStatsResponse>,
}

impl<Tz: TimeZone> ReportsPage<Tz> {
    pub fn new(
        backend: Arc<dyn ReportsBackend>,
        settings: SettingsService,
        tz: Tz,
        default_range: RangeType,
        today: NaiveDate,
    ) -> Self {
        Self {
            backend,
            settings,
            tz,
            selection: DateRangeSelection::from_type(default_range, today),
            db_stats: None,
        }
    }

    pub fn backend(&self) -> Arc<dyn ReportsBackend> {
        Arc::clone(&self.backend)
    }

    pub fn settings(&self) -> &SettingsService {
        &self.settings
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    pub fn selection(&self) -> &DateRangeSelection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: DateRangeSelection) {
        self.selection = selection;
    }

    /// The current selection as UTC instants.
    pub fn utc_range(&self) -> Result<UtcRange, PanelError> {
        Ok(self.selection.utc_range_in(&self.tz)?)
    }

    /// Query body for the timeseries-producing reports: the wire form of
    /// the selected range plus the bucket size derived from its length.
    pub fn timeseries_query(&self) -> Result<TimeseriesQuery, PanelError> {
        let range = self.utc_range()?;
        let (start, end) = range.wire();
        Ok(TimeseriesQuery {
            start,
            end,
            binsize: TimeseriesData::binsize_of_range(range.start, range.end),
        })
    }

    /// Mirror the current selection into the route query.
    pub fn write_route(&self, route: &mut RouteQuery) {
        route.set_range(&self.selection);
    }

    /// Adopt the range carried by the route, if any. Returns whether the
    /// selection changed; an unparseable range is ignored with a warning
    /// so a mangled link still lands on the default view.
    pub fn apply_route(&mut self, route: &RouteQuery, today: NaiveDate) -> bool {
        match route.range_selection(today) {
            Ok(Some(selection)) if selection != self.selection => {
                self.selection = selection;
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!(error = %e, "ignoring bad range in route query");
                false
            }
        }
    }

    pub async fn refresh_db_stats(&mut self) -> Result<(), PanelError> {
        self.db_stats = Some(self.backend.capture_db_stats().await?);
        Ok(())
    }

    pub fn db_stats(&self) -> Option<&CaptureDbStatsResponse> {
        self.db_stats.as_ref()
    }

    /// The UTC span actually covered by captured data, from the oldest
    /// to the newest connect time on record.
    pub fn capture_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let stats = self.db_stats.as_ref()?;
        let min = stats.db_stats.connect_time.min.as_deref()?;
        let max = stats.db_stats.connect_time.max.as_deref()?;
        let parse = |s: &str| match parse_utc(s, &stats.date_parse_format) {
            Ok(d) => Some(d),
            Err(e) => {
                warn!(value = s, error = %e, "unparseable connect time in db stats");
                None
            }
        };
        Some((parse(min)?, parse(max)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DbStats, DispositionCount, MinMax};
    use crate::backend::MemoryBackend;
    use crate::settings::{MemoryStore, SettingsService};
    use std::collections::HashMap;

    fn page() -> ReportsPage<Utc> {
        let settings = SettingsService::load(Arc::new(MemoryStore::new())).unwrap();
        ReportsPage::new(
            Arc::new(MemoryBackend::new()),
            settings,
            Utc,
            RangeType::LastDays(30),
            NaiveDate::from_ymd_opt(2024, 3, 30).unwrap(),
        )
    }

    #[test]
    fn test_timeseries_query_covers_selection() {
        let query = page().timeseries_query().unwrap();
        assert_eq!(query.start, "2024-03-01 00:00:00");
        assert_eq!(query.end, "2024-03-31 00:00:00");
        // 30 days / ~100 buckets, snapped to whole hours
        assert_eq!(query.binsize, 7 * 60);
    }

    #[test]
    fn test_route_round_trip() {
        let mut page = page();
        let mut route = RouteQuery::default();
        page.write_route(&mut route);
        assert_eq!(route.range_type.as_deref(), Some("last30days"));

        route.range_type = Some("mtd".to_string());
        let today = NaiveDate::from_ymd_opt(2024, 3, 30).unwrap();
        assert!(page.apply_route(&route, today));
        assert_eq!(page.selection().start, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        // applying the same route again is a no-op
        assert!(!page.apply_route(&route, today));
    }

    #[test]
    fn test_bad_route_range_is_ignored() {
        let mut page = page();
        let before = *page.selection();
        let route = RouteQuery {
            range_type: Some("fortnight".to_string()),
            ..RouteQuery::default()
        };
        assert!(!page.apply_route(&route, NaiveDate::from_ymd_opt(2024, 3, 30).unwrap()));
        assert_eq!(*page.selection(), before);
    }

    #[tokio::test]
    async fn test_capture_span() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_capture_db_stats(CaptureDbStatsResponse {
            date_parse_format: "%Y-%m-%d %H:%M:%S".to_string(),
            db_stats: DbStats {
                connect_time: MinMax {
                    min: Some("2024-01-01 08:00:00".to_string()),
                    max: Some("2024-03-01 12:00:00".to_string()),
                },
                count: 42,
                disposition: HashMap::from([("ok".to_string(), DispositionCount { count: 42 })]),
            },
        });
        let settings = SettingsService::load(Arc::new(MemoryStore::new())).unwrap();
        let mut page = ReportsPage::new(
            backend,
            settings,
            Utc,
            RangeType::LastDays(7),
            NaiveDate::from_ymd_opt(2024, 3, 30).unwrap(),
        );

        assert!(page.capture_span().is_none());
        page.refresh_db_stats().await.unwrap();
        let (min, max) = page.capture_span().unwrap();
        assert_eq!(min, Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap());
        assert_eq!(max, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    }
}
