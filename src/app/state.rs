//! Defines the central, mutable state of the application.

use crate::config::{settings, AppConfig};
use crate::core::{Category, CategoryFilter, CoreError, CoreResult, FileRecord, JsonTagStore};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;

/// Holds the complete, mutable state of the application.
///
/// This struct is wrapped in an `Arc<Mutex<...>>` to allow for safe, shared access
/// from different threads (e.g., the main event loop, IPC handlers, and async tasks).
/// The lock is never held across an `.await`.
#[derive(Default)]
pub struct AppState {
    /// The application's configuration settings.
    pub config: AppConfig,
    /// Where `config` is persisted. `None` means the platform config directory.
    pub config_dir: Option<PathBuf>,
    /// Every item found under the storage root, rebuilt after each mutation.
    pub all_files: Vec<FileRecord>,
    /// The items the current filters let through, in scan order.
    pub visible_files: Vec<FileRecord>,
    pub current_category: CategoryFilter,
    /// The search term currently applied (after debouncing).
    pub search_query: String,
    /// Active tag filters, remembered per category.
    pub selected_tags: HashMap<Category, Vec<String>>,
    /// Tag vocabulary per category, mirrored from the tag store.
    pub vocabularies: HashMap<Category, Vec<String>>,
    /// File tag assignments per category, mirrored from the tag store.
    pub file_tags: HashMap<Category, HashMap<PathBuf, Vec<String>>>,
    /// `true` while an import is running; the UI disables its import controls.
    pub is_importing: bool,
    /// The pending debounced search, if any.
    pub search_task: Option<JoinHandle<()>>,
    pub status_message: String,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Loads the configuration from the platform config directory.
    pub fn load() -> Self {
        Self::new(AppConfig::load().unwrap_or_default())
    }

    /// Persists the configuration, logging failures.
    pub fn save_config(&self) {
        if let Err(e) = settings::save_config(&self.config, self.config_dir.as_deref()) {
            tracing::error!("Failed to save config: {}", e);
        }
    }

    pub fn storage_root(&self) -> CoreResult<PathBuf> {
        self.config
            .storage_path()
            .map(Path::to_path_buf)
            .ok_or(CoreError::StorageNotConfigured)
    }

    pub fn tag_store(&self) -> CoreResult<JsonTagStore> {
        JsonTagStore::for_storage(self.config.storage_path())
    }

    /// The cached tags of `path` within `category`.
    pub fn tags_of(&self, category: Category, path: &Path) -> Vec<String> {
        self.file_tags
            .get(&category)
            .and_then(|tags| tags.get(path))
            .cloned()
            .unwrap_or_default()
    }

    /// The selected tags of the current category; empty for `all`.
    pub fn current_selected_tags(&self) -> Vec<String> {
        self.current_category
            .category()
            .and_then(|category| self.selected_tags.get(&category))
            .cloned()
            .unwrap_or_default()
    }

    /// Selects `tag` in the current category, or deselects it if selected.
    /// Returns `false` when the current category is `all`.
    pub fn toggle_selected_tag(&mut self, tag: &str) -> bool {
        let Some(category) = self.current_category.category() else {
            return false;
        };
        let selected = self.selected_tags.entry(category).or_default();
        if let Some(index) = selected.iter().position(|t| t == tag) {
            selected.remove(index);
        } else {
            selected.push(tag.to_string());
        }
        true
    }

    /// Keeps the selection of `category` in step with a renamed tag.
    pub fn rename_selected_tag(&mut self, category: Category, old: &str, new: &str) {
        if let Some(selected) = self.selected_tags.get_mut(&category) {
            for tag in selected.iter_mut().filter(|tag| *tag == old) {
                *tag = new.to_string();
            }
        }
    }

    /// Drops a deleted tag from the selection of `category`.
    pub fn remove_selected_tag(&mut self, category: Category, name: &str) {
        if let Some(selected) = self.selected_tags.get_mut(&category) {
            selected.retain(|tag| tag != name);
        }
    }

    /// Aborts the pending debounced search, if any.
    pub fn cancel_search_task(&mut self) {
        if let Some(handle) = self.search_task.take() {
            handle.abort();
        }
    }

    /// Forgets everything derived from the current storage root.
    pub fn reset_storage_state(&mut self) {
        self.cancel_search_task();
        self.all_files.clear();
        self.visible_files.clear();
        self.selected_tags.clear();
        self.vocabularies.clear();
        self.file_tags.clear();
        self.search_query.clear();
        self.current_category = CategoryFilter::All;
    }
}
