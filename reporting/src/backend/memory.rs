//! In-memory backend serving canned responses.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::api::{
    CaptureDbStatsResponse, FlaggedConnectionsResponse, ImapDetailsQuery, ImapDetailsResponse,
    MessagesReceivedResponse, MessagesSentResponse, RemoteSenderActivityQuery,
    RemoteSenderActivityResponse, SuggestionsQuery, SuggestionsResponse, TimeseriesQuery,
    UserActivityQuery, UserActivityResponse,
};
use crate::backend::{BackendError, ReportsBackend};

#[derive(Default)]
struct State {
    fail_next: Option<BackendError>,
    calls: Vec<&'static str>,
    capture_db_stats: Option<CaptureDbStatsResponse>,
    user_list: Option<Vec<String>>,
    messages_sent: Option<MessagesSentResponse>,
    messages_received: Option<MessagesReceivedResponse>,
    flagged_connections: Option<FlaggedConnectionsResponse>,
    user_activity: Option<UserActivityResponse>,
    imap_details: Option<ImapDetailsResponse>,
    remote_sender_activity: Option<RemoteSenderActivityResponse>,
    suggestions: Option<SuggestionsResponse>,
}

/// Backend stand-in holding one canned response per endpoint. Records
/// endpoint names as they are hit and can be armed to fail the next
/// call.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next call with `error` instead of answering.
    pub fn fail_next(&self, error: BackendError) {
        self.state.lock().fail_next = Some(error);
    }

    /// Endpoint names hit so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }

    pub fn set_capture_db_stats(&self, response: CaptureDbStatsResponse) {
        self.state.lock().capture_db_stats = Some(response);
    }

    pub fn set_user_list(&self, users: Vec<String>) {
        self.state.lock().user_list = Some(users);
    }

    pub fn set_messages_sent(&self, response: MessagesSentResponse) {
        self.state.lock().messages_sent = Some(response);
    }

    pub fn set_messages_received(&self, response: MessagesReceivedResponse) {
        self.state.lock().messages_received = Some(response);
    }

    pub fn set_flagged_connections(&self, response: FlaggedConnectionsResponse) {
        self.state.lock().flagged_connections = Some(response);
    }

    pub fn set_user_activity(&self, response: UserActivityResponse) {
        self.state.lock().user_activity = Some(response);
    }

    pub fn set_imap_details(&self, response: ImapDetailsResponse) {
        self.state.lock().imap_details = Some(response);
    }

    pub fn set_remote_sender_activity(&self, response: RemoteSenderActivityResponse) {
        self.state.lock().remote_sender_activity = Some(response);
    }

    pub fn set_suggestions(&self, response: SuggestionsResponse) {
        self.state.lock().suggestions = Some(response);
    }

    fn answer<R>(
        &self,
        endpoint: &'static str,
        pick: impl FnOnce(&State) -> Option<R>,
    ) -> Result<R, BackendError> {
        let mut state = self.state.lock();
        state.calls.push(endpoint);
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        pick(&state).ok_or_else(|| {
            BackendError::InvalidRequest(format!("no canned response for '{endpoint}'"))
        })
    }
}

#[async_trait]
impl ReportsBackend for MemoryBackend {
    async fn capture_db_stats(&self) -> Result<CaptureDbStatsResponse, BackendError> {
        self.answer("capture-db-stats", |s| s.capture_db_stats.clone())
    }

    async fn user_list(&self) -> Result<Vec<String>, BackendError> {
        self.answer("user-list", |s| s.user_list.clone())
    }

    async fn messages_sent(
        &self,
        _query: &TimeseriesQuery,
    ) -> Result<MessagesSentResponse, BackendError> {
        self.answer("messages-sent", |s| s.messages_sent.clone())
    }

    async fn messages_received(
        &self,
        _query: &TimeseriesQuery,
    ) -> Result<MessagesReceivedResponse, BackendError> {
        self.answer("messages-received", |s| s.messages_received.clone())
    }

    async fn flagged_connections(
        &self,
        _query: &TimeseriesQuery,
    ) -> Result<FlaggedConnectionsResponse, BackendError> {
        self.answer("flagged-connections", |s| s.flagged_connections.clone())
    }

    async fn user_activity(
        &self,
        _query: &UserActivityQuery,
    ) -> Result<UserActivityResponse, BackendError> {
        self.answer("user-activity", |s| s.user_activity.clone())
    }

    async fn imap_details(
        &self,
        _query: &ImapDetailsQuery,
    ) -> Result<ImapDetailsResponse, BackendError> {
        self.answer("imap-details", |s| s.imap_details.clone())
    }

    async fn remote_sender_activity(
        &self,
        _query: &RemoteSenderActivityQuery,
    ) -> Result<RemoteSenderActivityResponse, BackendError> {
        self.answer("remote-sender-activity", |s| s.remote_sender_activity.clone())
    }

    async fn select_list_suggestions(
        &self,
        _query: &SuggestionsQuery,
    ) -> Result<SuggestionsResponse, BackendError> {
        self.answer("select-list-suggestions", |s| s.suggestions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unset_endpoint_is_an_invalid_request() {
        let backend = MemoryBackend::new();
        let err = backend.user_list().await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidRequest(_)));
        assert_eq!(backend.calls(), vec!["user-list"]);
    }

    #[tokio::test]
    async fn test_fail_next_takes_precedence() {
        let backend = MemoryBackend::new();
        backend.set_user_list(vec!["alice@example.com".to_string()]);
        backend.fail_next(BackendError::Auth);
        assert!(backend.user_list().await.unwrap_err().is_auth());
        // the armed failure is consumed
        assert_eq!(backend.user_list().await.unwrap(), vec!["alice@example.com"]);
    }
}
