//! Data access for the reporting endpoints.
//!
//! [`ReportsBackend`] is the seam between panels and the server:
//! [`HttpBackend`] talks to the real JSON API, [`MemoryBackend`] serves
//! canned responses for tests. Submodules:
//!
//! - [`error`]: backend error taxonomy
//! - [`http`]: reqwest implementation
//! - [`memory`]: in-memory implementation

pub mod error;
pub mod http;
pub mod memory;

use async_trait::async_trait;

use crate::api::{
    CaptureDbStatsResponse, FlaggedConnectionsResponse, ImapDetailsQuery, ImapDetailsResponse,
    MessagesReceivedResponse, MessagesSentResponse, RemoteSenderActivityQuery,
    RemoteSenderActivityResponse, SuggestionsQuery, SuggestionsResponse, TimeseriesQuery,
    UserActivityQuery, UserActivityResponse,
};

pub use error::BackendError;
pub use http::HttpBackend;
pub use memory::MemoryBackend;

/// The report queries the server answers. One method per endpoint; all
/// date arguments travel as UTC strings produced by
/// [`crate::models::time::UtcRange::wire`].
#[async_trait]
pub trait ReportsBackend: Send + Sync {
    async fn capture_db_stats(&self) -> Result<CaptureDbStatsResponse, BackendError>;

    async fn user_list(&self) -> Result<Vec<String>, BackendError>;

    async fn messages_sent(
        &self,
        query: &TimeseriesQuery,
    ) -> Result<MessagesSentResponse, BackendError>;

    async fn messages_received(
        &self,
        query: &TimeseriesQuery,
    ) -> Result<MessagesReceivedResponse, BackendError>;

    async fn flagged_connections(
        &self,
        query: &TimeseriesQuery,
    ) -> Result<FlaggedConnectionsResponse, BackendError>;

    async fn user_activity(
        &self,
        query: &UserActivityQuery,
    ) -> Result<UserActivityResponse, BackendError>;

    async fn imap_details(
        &self,
        query: &ImapDetailsQuery,
    ) -> Result<ImapDetailsResponse, BackendError>;

    async fn remote_sender_activity(
        &self,
        query: &RemoteSenderActivityQuery,
    ) -> Result<RemoteSenderActivityResponse, BackendError>;

    async fn select_list_suggestions(
        &self,
        query: &SuggestionsQuery,
    ) -> Result<SuggestionsResponse, BackendError>;
}
