//! Panel state controllers.
//!
//! Each report panel owns a date range (and, for drill-down panels, a
//! selected user or remote sender), fetches its data through a
//! [`crate::backend::ReportsBackend`], and builds the chart/table models
//! the renderers consume. Panels keep their last good models on failure
//! and mirror the loaded selection into the navigable route.
//!
//! - [`state`]: load-state machine with generation-tagged requests
//! - [`route`]: typed route-query synchronization
//! - [`page`]: page-level controller (date range, capture DB stats)
//! - [`messages_sent`], [`flagged_connections`], [`user_activity`],
//!   [`remote_sender_activity`]: the concrete panels

pub mod flagged_connections;
pub mod messages_sent;
pub mod page;
pub mod remote_sender_activity;
pub mod route;
pub mod state;
pub mod user_activity;

use thiserror::Error;

use crate::backend::BackendError;
use crate::models::table::TableError;
use crate::models::time::TimeError;
use crate::models::timeseries::TimeseriesError;

pub use page::ReportsPage;
pub use route::RouteQuery;
pub use state::{LoadState, PanelCore};

#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Time(#[from] TimeError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Timeseries(#[from] TimeseriesError),
}

/// What the shared root-level handler should do with a panel failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// The session is gone; navigate to the login entry point.
    RedirectToLogin,
    /// Show the message; previously loaded models stay visible.
    Display(String),
}

/// Root error policy: authentication failures redirect, everything else
/// is displayed in place.
pub fn dispose_error(error: &PanelError) -> ErrorDisposition {
    match error {
        PanelError::Backend(e) if e.is_auth() => ErrorDisposition::RedirectToLogin,
        other => ErrorDisposition::Display(other.to_string()),
    }
}
