//! reqwest implementation of the reports backend.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::{
    CaptureDbStatsResponse, FlaggedConnectionsResponse, ImapDetailsQuery, ImapDetailsResponse,
    MessagesReceivedResponse, MessagesSentResponse, RemoteSenderActivityQuery,
    RemoteSenderActivityResponse, SuggestionsQuery, SuggestionsResponse, TimeseriesQuery,
    UserActivityQuery, UserActivityResponse,
};
use crate::backend::{BackendError, ReportsBackend};

/// Some endpoints report an expired session with a 200 response whose
/// body carries this marker instead of a real payload.
#[derive(Debug, Deserialize)]
struct StatusMarker {
    status: Option<String>,
}

/// Talks to the reporting JSON API under a fixed base URL.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, BackendError> {
        debug!(%path, "GET");
        let response = self.client.get(self.url(path)).send().await?;
        Self::decode(path, response).await
    }

    async fn post_json<Q: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<R, BackendError> {
        debug!(%path, "POST");
        let response = self.client.post(self.url(path)).json(query).send().await?;
        Self::decode(path, response).await
    }

    async fn decode<R: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<R, BackendError> {
        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(BackendError::Auth);
        }
        let body = response.bytes().await?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            warn!(%path, status = status.as_u16(), "request failed");
            if status.as_u16() == 400 {
                return Err(BackendError::InvalidRequest(body));
            }
            return Err(BackendError::Http {
                status: status.as_u16(),
                body,
            });
        }
        if let Ok(marker) = serde_json::from_slice::<StatusMarker>(&body) {
            if marker.status.as_deref() == Some("invalid") {
                return Err(BackendError::Auth);
            }
        }
        let mut de = serde_json::Deserializer::from_slice(&body);
        serde_path_to_error::deserialize(&mut de).map_err(|source| BackendError::Decode {
            endpoint: path.to_string(),
            source,
        })
    }
}

#[async_trait]
impl ReportsBackend for HttpBackend {
    async fn capture_db_stats(&self) -> Result<CaptureDbStatsResponse, BackendError> {
        self.get_json("reports/capture/db/stats").await
    }

    async fn user_list(&self) -> Result<Vec<String>, BackendError> {
        self.get_json("reports/uidata/user-list").await
    }

    async fn messages_sent(
        &self,
        query: &TimeseriesQuery,
    ) -> Result<MessagesSentResponse, BackendError> {
        self.post_json("reports/uidata/messages-sent", query).await
    }

    async fn messages_received(
        &self,
        query: &TimeseriesQuery,
    ) -> Result<MessagesReceivedResponse, BackendError> {
        self.post_json("reports/uidata/messages-received", query).await
    }

    async fn flagged_connections(
        &self,
        query: &TimeseriesQuery,
    ) -> Result<FlaggedConnectionsResponse, BackendError> {
        self.post_json("reports/uidata/flagged-connections", query).await
    }

    async fn user_activity(
        &self,
        query: &UserActivityQuery,
    ) -> Result<UserActivityResponse, BackendError> {
        self.post_json("reports/uidata/user-activity", query).await
    }

    async fn imap_details(
        &self,
        query: &ImapDetailsQuery,
    ) -> Result<ImapDetailsResponse, BackendError> {
        self.post_json("reports/uidata/imap-details", query).await
    }

    async fn remote_sender_activity(
        &self,
        query: &RemoteSenderActivityQuery,
    ) -> Result<RemoteSenderActivityResponse, BackendError> {
        self.post_json("reports/uidata/remote-sender-activity", query).await
    }

    async fn select_list_suggestions(
        &self,
        query: &SuggestionsQuery,
    ) -> Result<SuggestionsResponse, BackendError> {
        self.post_json("reports/uidata/select-list-suggestions", query).await
    }
}
