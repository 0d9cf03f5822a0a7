//! End-to-end panel flow against the in-memory backend.

use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use serde_json::json;

use mail_reports::api::{
    MessagesReceivedResponse, MessagesSentResponse, SeriesPayload, TablePayload,
    TimeseriesPayload,
};
use mail_reports::backend::{BackendError, MemoryBackend, ReportsBackend};
use mail_reports::models::table::ReportTable;
use mail_reports::models::time::RangeType;
use mail_reports::models::timeseries::TimeseriesData;
use mail_reports::panels::messages_sent::MessagesSentPanel;
use mail_reports::panels::{dispose_error, ErrorDisposition, LoadState, ReportsPage, RouteQuery};
use mail_reports::settings::{MemoryStore, SettingsService};

fn table_payload() -> TablePayload {
    serde_json::from_value(json!({
        "items": [["alice@example.com", 12, 34567]],
        "fields": ["user", "count", "size"],
        "field_types": ["text/email", "number/plain", "number/size"]
    }))
    .unwrap()
}

fn ts_payload(ids: &[&str]) -> TimeseriesPayload {
    TimeseriesPayload {
        y: "messages".to_string(),
        range: vec![
            "2024-03-01 00:00:00".to_string(),
            "2024-03-31 00:00:00".to_string(),
        ],
        range_parse_format: Some("%Y-%m-%d %H:%M:%S".to_string()),
        binsize: 7 * 60,
        date_parse_format: "%Y-%m-%d %H:%M:%S".to_string(),
        dates: vec![
            "2024-03-01 00:00:00".to_string(),
            "2024-03-01 07:00:00".to_string(),
        ],
        series: ids
            .iter()
            .map(|id| SeriesPayload {
                id: id.to_string(),
                name: id.to_string(),
                values: vec![Some(1.0), None],
            })
            .collect(),
    }
}

fn sent_response() -> MessagesSentResponse {
    MessagesSentResponse {
        top_senders_by_count: table_payload(),
        top_senders_by_size: table_payload(),
        ts_sent: ts_payload(&["sent", "local", "remote"]),
    }
}

fn page(backend: Arc<MemoryBackend>) -> ReportsPage<Utc> {
    let settings = SettingsService::load(Arc::new(MemoryStore::new())).unwrap();
    ReportsPage::new(
        backend,
        settings,
        Utc,
        RangeType::LastDays(30),
        NaiveDate::from_ymd_opt(2024, 3, 30).unwrap(),
    )
}

#[tokio::test]
async fn activation_loads_models_and_updates_route() -> Result<()> {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_messages_sent(sent_response());
    let page = page(backend.clone());

    let mut panel = MessagesSentPanel::new();
    assert_eq!(panel.state(), LoadState::Idle);

    panel.activate(&page).await?;
    assert_eq!(panel.state(), LoadState::Loaded);

    let models = panel.models().expect("models after load");
    assert_eq!(models.sent.series.len(), 1);
    assert!(models.sent.series[0].values[1].is_nan());
    assert_eq!(models.by_destination.series.len(), 2);
    assert_eq!(models.top_senders_by_count.rows.len(), 1);

    // the route is rewritten from the page's selection after the load
    let mut route = RouteQuery::default();
    page.write_route(&mut route);
    assert_eq!(route.range_type.as_deref(), Some("last30days"));
    assert!(route.start.is_none());

    // re-activating the already-loaded selection does not refetch
    panel.activate(&page).await?;
    assert_eq!(backend.calls(), vec!["messages-sent"]);
    Ok(())
}

#[tokio::test]
async fn failure_keeps_models_and_auth_redirects() -> Result<()> {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_messages_sent(sent_response());
    let mut page = page(backend.clone());

    let mut panel = MessagesSentPanel::new();
    panel.activate(&page).await?;

    // a new range whose fetch dies with an expired session
    let today = NaiveDate::from_ymd_opt(2024, 3, 30).unwrap();
    page.set_selection(mail_reports::models::time::DateRangeSelection::from_type(
        RangeType::Mtd,
        today,
    ));
    backend.fail_next(BackendError::Auth);
    let err = panel.activate(&page).await.unwrap_err();
    assert_eq!(dispose_error(&err), ErrorDisposition::RedirectToLogin);

    // the previous models are still shown behind the error
    assert_eq!(panel.state(), LoadState::Failed);
    assert!(panel.models().is_some());

    // and a retry succeeds
    panel.activate(&page).await?;
    assert_eq!(panel.state(), LoadState::Loaded);
    Ok(())
}

#[tokio::test]
async fn non_auth_failures_display_in_place() -> Result<()> {
    let backend = Arc::new(MemoryBackend::new());
    backend.fail_next(BackendError::Http {
        status: 503,
        body: "maintenance".to_string(),
    });
    let page = page(backend);

    let mut panel = MessagesSentPanel::new();
    let err = panel.activate(&page).await.unwrap_err();
    match dispose_error(&err) {
        ErrorDisposition::Display(msg) => assert!(msg.contains("503")),
        other => panic!("unexpected disposition {other:?}"),
    }
    assert!(panel.models().is_none());
    Ok(())
}

#[tokio::test]
async fn messages_received_envelope_builds_models() -> Result<()> {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_messages_received(MessagesReceivedResponse {
        top_senders_by_count: table_payload(),
        top_senders_by_size: table_payload(),
        top_hosts_by_spam_score: table_payload(),
        top_user_receiving_spam: table_payload(),
        ts_received: ts_payload(&["received"]),
    });
    let page = page(backend);

    let query = page.timeseries_query()?;
    let response = page.backend().messages_received(&query).await?;
    let ts = TimeseriesData::from_payload(response.ts_received)?;
    assert_eq!(ts.get_series("received").map(|s| s.values.len()), Some(2));

    let table = ReportTable::from_payload(response.top_hosts_by_spam_score)?;
    assert_eq!(table.rows.len(), 1);
    Ok(())
}
