//! # Mail Reports
//!
//! Data-shaping core for the mail-server reporting dashboard.
//!
//! The capture daemon records mail-server activity (SMTP connections,
//! deliveries, IMAP logins) in a database exposed through a JSON API. This
//! crate turns those raw query results into chart- and table-ready
//! structures: timeseries binning, semantic column formatting, row
//! flagging, chart geometry, and the per-panel fetch/state machinery that
//! keeps the UI, the navigable route, and the backend in sync.
//!
//! ## Architecture
//!
//! - [`format`]: locale-aware number, size, timespan, and date formatting
//! - [`models`]: timeseries, table, column, and date-range models
//! - [`api`]: DTOs for the backend JSON contract
//! - [`backend`]: data-access trait, HTTP and in-memory implementations
//! - [`charts`]: line, stacked-bar, and pie renderers producing draw
//!   primitives, plus hover hit-testing
//! - [`panels`]: per-report panel controllers and route synchronization
//! - [`settings`]: persisted user preferences behind a store trait
//! - [`config`]: dashboard configuration

pub mod api;
pub mod backend;
pub mod charts;
pub mod config;
pub mod format;
pub mod models;
pub mod panels;
pub mod settings;
