pub mod category;
pub mod download;
pub mod error;
pub mod filter;
pub mod importer;
pub mod preview;
pub mod project;
pub mod scanner;
pub mod tags;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One entry of the in-memory collection.
///
/// Records are never persisted themselves; they are rebuilt by scanning the
/// category folders of the storage root after every mutating operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Absolute path under the storage root.
    pub path: PathBuf,
    /// Base name including the extension.
    pub name: String,
    /// Bytes; for directories the recursive sum of contained files.
    pub size: u64,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_project: Option<bool>,
    /// Raster preview for icon formats that cannot be displayed directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_path: Option<PathBuf>,
    /// Display copy of the file's tags; the tag store is authoritative.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl FileRecord {
    pub fn category(&self) -> Option<Category> {
        self.file_type.category()
    }
}

pub use category::{Category, CategoryFilter, FileType};
pub use error::{CoreError, CoreResult};
pub use filter::{category_counts, compute_visible, FilterQuery};
pub use importer::{import_paths, ImportDestination};
pub use project::{is_code_project, project_stats, ProjectStats};
pub use scanner::load_existing;
pub use tags::{JsonTagStore, TagStore};
