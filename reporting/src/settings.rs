//! Persisted user preferences.
//!
//! An explicitly constructed service handed to the panels that need it.
//! Persistence sits behind [`SettingsStore`], with an in-memory store
//! for tests and a JSON file store for real deployments. The shared
//! handle is cheap to clone; reads and writes are synchronous behind a
//! lock.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Capacity of each recent-value list.
const RECENT_LIST_MAX: usize = 10;
/// Storage key under which settings persist.
const STORAGE_KEY: &str = "user_settings";

#[derive(Debug, Error)]
pub enum SettingsError {
    /// Value validation failure, reported inline to the originating
    /// form; other settings are untouched.
    #[error("row limit must be at least {minimum}, got {given}")]
    RowLimitTooSmall { given: u32, minimum: u32 },
    #[error("cannot persist settings: {0}")]
    Store(#[from] std::io::Error),
    #[error("stored settings are unreadable: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// The persisted data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSettings {
    pub row_limit: u32,
    /// Per-category most-recently-used values, newest first.
    #[serde(default)]
    pub recent: HashMap<String, Vec<String>>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            row_limit: 1000,
            recent: HashMap::new(),
        }
    }
}

/// Persistence seam for [`SettingsService`].
pub trait SettingsStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<UserSettings>, SettingsError>;
    fn save(&self, key: &str, settings: &UserSettings) -> Result<(), SettingsError>;
}

/// Keeps settings only for the life of the process.
#[derive(Default)]
pub struct MemoryStore {
    saved: RwLock<HashMap<String, UserSettings>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<UserSettings>, SettingsError> {
        Ok(self.saved.read().get(key).cloned())
    }

    fn save(&self, key: &str, settings: &UserSettings) -> Result<(), SettingsError> {
        self.saved.write().insert(key.to_string(), settings.clone());
        Ok(())
    }
}

/// Stores each key as a JSON file under a directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<UserSettings>, SettingsError> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&self, key: &str, settings: &UserSettings) -> Result<(), SettingsError> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(self.path(key), json)?;
        Ok(())
    }
}

/// Settings service: loads once, saves after each mutation.
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn SettingsStore>,
    settings: Arc<RwLock<UserSettings>>,
}

impl SettingsService {
    pub fn load(store: Arc<dyn SettingsStore>) -> Result<Self, SettingsError> {
        let settings = store.load(STORAGE_KEY)?.unwrap_or_default();
        debug!(row_limit = settings.row_limit, "settings loaded");
        Ok(Self {
            store,
            settings: Arc::new(RwLock::new(settings)),
        })
    }

    pub fn row_limit(&self) -> u32 {
        self.settings.read().row_limit
    }

    /// Validated setter; a rejected value leaves everything untouched.
    pub fn set_row_limit(&self, v: u32) -> Result<(), SettingsError> {
        if v < 5 {
            return Err(SettingsError::RowLimitTooSmall { given: v, minimum: 5 });
        }
        let mut settings = self.settings.write();
        settings.row_limit = v;
        self.store.save(STORAGE_KEY, &settings)
    }

    pub fn recent_list(&self, category: &str) -> Vec<String> {
        self.settings
            .read()
            .recent
            .get(category)
            .cloned()
            .unwrap_or_default()
    }

    /// Move `value` to the front of the category's recent list,
    /// replacing a case-insensitive duplicate, capped at ten entries.
    /// Returns the updated list.
    pub fn add_to_recent_list(
        &self,
        category: &str,
        value: &str,
    ) -> Result<Vec<String>, SettingsError> {
        let mut settings = self.settings.write();
        let list = settings.recent.entry(category.to_string()).or_default();
        if let Some(found) = list
            .iter()
            .position(|s| s.eq_ignore_ascii_case(value))
        {
            list.remove(found);
        }
        list.insert(0, value.to_string());
        list.truncate(RECENT_LIST_MAX);
        let updated = list.clone();
        self.store.save(STORAGE_KEY, &settings)?;
        Ok(updated)
    }
}
