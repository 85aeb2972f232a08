pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application settings, persisted as camelCase JSON.
///
/// Every field has a default, so a file holding only `storagePath` loads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// The directory holding the category folders. `None` until chosen.
    pub storage_path: Option<PathBuf>,
    /// Whether the search box also matches tag names.
    pub search_includes_tags: bool,
    pub search_debounce_ms: u64,
    /// Requested before every URL import; any answer counts as online.
    pub reachability_probe_url: String,
    pub network_timeout_secs: u64,
    pub delete_retries: u32,
    pub delete_retry_delay_ms: u64,
    pub window_size: (f64, f64),
    pub window_position: (f64, f64),
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }

    pub fn storage_path(&self) -> Option<&Path> {
        self.storage_path.as_deref()
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(self.network_timeout_secs)
    }

    pub fn delete_retry_delay(&self) -> Duration {
        Duration::from_millis(self.delete_retry_delay_ms)
    }

    /// Where the storage folder picker starts when nothing is configured.
    pub fn suggested_storage_path() -> Option<PathBuf> {
        dirs::document_dir()
            .or_else(dirs::home_dir)
            .map(|dir| dir.join("MaterialVault"))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_path: None,
            search_includes_tags: false,
            search_debounce_ms: 300,
            reachability_probe_url: "https://www.baidu.com".to_string(),
            network_timeout_secs: 5,
            delete_retries: 3,
            delete_retry_delay_ms: 100,
            window_size: (1200.0, 800.0),
            window_position: (100.0, 100.0),
        }
    }
}
