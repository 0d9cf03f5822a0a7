//! Dashboard configuration.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::format::NumberFormat;
use crate::models::time::RangeType;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid default_range_type: {0}")]
    BadRangeType(#[from] crate::models::time::TimeError),
}

fn default_base_url() -> String {
    "http://localhost:10222".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_range_type() -> String {
    "last30days".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Base URL of the admin server hosting the reporting endpoints.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Route form of the initial date range, e.g. `"last30days"`.
    #[serde(default = "default_range_type")]
    pub default_range_type: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            locale: default_locale(),
            default_range_type: default_range_type(),
        }
    }
}

impl DashboardConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_str(&raw)?;
        info!(path = %path.as_ref().display(), "config loaded");
        Ok(config)
    }

    pub fn from_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn default_range(&self) -> Result<RangeType, ConfigError> {
        Ok(RangeType::from_route_str(&self.default_range_type)?)
    }

    /// Numeric separators for the configured locale.
    pub fn number_format(&self) -> NumberFormat {
        NumberFormat::for_locale(&self.locale)
    }
}
