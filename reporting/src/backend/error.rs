//! Backend error taxonomy.

use thiserror::Error;

/// Failures from a [`super::ReportsBackend`].
///
/// `Auth` is deliberately distinct from the generic failures: the root
/// error policy redirects it to the login entry point instead of
/// displaying it.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The session is missing or expired (HTTP 401/403, or a response
    /// body carrying the `{"status": "invalid"}` marker).
    #[error("not authenticated")]
    Auth,

    /// The server rejected the query arguments.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Any other non-success HTTP status.
    #[error("server returned {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body did not match the wire contract.
    #[error("bad response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_path_to_error::Error<serde_json::Error>,
    },

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
}

impl BackendError {
    /// Whether the root handler should redirect to login.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth)
    }
}
