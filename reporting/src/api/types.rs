//! Request and response DTOs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::column::FieldType;

/// One named value sequence as sent by the server. `null` entries mean
/// "no data" for that bucket and become NaN in the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesPayload {
    pub id: String,
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Timeseries response body. All dates are UTC strings in the formats
/// the payload itself names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeseriesPayload {
    /// Value-axis description.
    pub y: String,
    /// Queried `[start, end]` pair, end exclusive.
    pub range: Vec<String>,
    pub range_parse_format: Option<String>,
    /// Bucket width in minutes.
    pub binsize: i64,
    pub date_parse_format: String,
    pub dates: Vec<String>,
    pub series: Vec<SeriesPayload>,
}

/// Table response body. Rows arrive in compact array form positionally
/// matched to `fields`; all three parts are required and validated at
/// model construction.
#[derive(Debug, Clone, Deserialize)]
pub struct TablePayload {
    pub y: Option<String>,
    pub items: Option<Vec<Value>>,
    pub fields: Option<Vec<String>>,
    pub field_types: Option<Vec<FieldType>>,
}

/// One pie slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieDatum {
    pub name: String,
    pub value: f64,
}

/// Body of the timeseries-producing report queries.
#[derive(Debug, Clone, Serialize)]
pub struct TimeseriesQuery {
    /// `YYYY-MM-DD HH:MM:SS` UTC.
    pub start: String,
    pub end: String,
    /// Requested bucket width in minutes.
    pub binsize: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserActivityQuery {
    pub user_id: String,
    pub start_date: String,
    pub end_date: String,
    pub row_limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImapDetailsQuery {
    pub user_id: String,
    pub start_date: String,
    pub end_date: String,
    pub row_limit: u32,
    pub disposition: String,
    pub remote_host: String,
}

/// Which selection field a remote-sender query filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    EnvelopeFrom,
    RemoteHost,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoteSenderActivityQuery {
    pub sender: String,
    pub sender_type: SenderType,
    pub start_date: String,
    pub end_date: String,
    pub row_limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionsQuery {
    /// Suggestion category, e.g. `remote_host` or `envelope_from`.
    #[serde(rename = "type")]
    pub query_type: String,
    pub query: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagesSentResponse {
    pub top_senders_by_count: TablePayload,
    pub top_senders_by_size: TablePayload,
    pub ts_sent: TimeseriesPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagesReceivedResponse {
    pub top_senders_by_count: TablePayload,
    pub top_senders_by_size: TablePayload,
    pub top_hosts_by_spam_score: TablePayload,
    pub top_user_receiving_spam: TablePayload,
    pub ts_received: TimeseriesPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlaggedConnectionsResponse {
    pub connections_by_disposition: Vec<PieDatum>,
    pub flagged: TimeseriesPayload,
    pub reject_by_failure_category: Vec<PieDatum>,
    pub top_hosts_rejected: TablePayload,
    pub insecure_inbound: TablePayload,
    pub insecure_outbound: TablePayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserActivityResponse {
    pub sent_mail: TablePayload,
    pub received_mail: TablePayload,
    pub imap_conn_summary: TablePayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImapDetailsResponse {
    pub imap_details: TablePayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSenderActivityResponse {
    pub activity: TablePayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionsResponse {
    /// True when the query matched a single exact value.
    pub exact: bool,
    pub suggestions: Vec<String>,
    /// True when the fuzzy match hit the server-side result cap.
    pub limited: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMax {
    pub min: Option<String>,
    pub max: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispositionCount {
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbStats {
    pub connect_time: MinMax,
    pub count: i64,
    pub disposition: HashMap<String, DispositionCount>,
}

/// Capture database statistics shown on the main page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureDbStatsResponse {
    pub date_parse_format: String,
    pub db_stats: DbStats,
}
