//! Responsible for transforming the `AppState` into a `UiState` view model.
//!
//! This module acts as a presentation layer, preparing data specifically for consumption
//! by the UI: one card per visible item, the sidebar counts and the tag bar of the
//! current category.

use crate::core::preview::format_file_size;
use crate::core::{category_counts, Category, CategoryFilter, FileRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use super::state::AppState;

/// A serializable representation of the application state for the UI.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub storage_path: Option<PathBuf>,
    pub current_category: CategoryFilter,
    pub search_query: String,
    pub search_includes_tags: bool,
    /// Sidebar entries, `all` first, counted over the unfiltered list.
    pub categories: Vec<CategoryEntry>,
    pub cards: Vec<FileCard>,
    /// Vocabulary of the current category; empty for `all`.
    pub vocabulary: Vec<String>,
    pub selected_tags: Vec<String>,
    pub is_importing: bool,
    pub status_message: String,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEntry {
    pub id: CategoryFilter,
    pub count: usize,
}

/// A serializable representation of a single card in the file grid.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FileCard {
    pub path: PathBuf,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub category: Option<Category>,
    pub size: u64,
    pub formatted_size: String,
    pub last_modified: DateTime<Utc>,
    pub is_project: bool,
    pub preview_path: Option<PathBuf>,
    pub tags: Vec<String>,
}

impl From<&FileRecord> for FileCard {
    fn from(record: &FileRecord) -> Self {
        Self {
            path: record.path.clone(),
            name: record.name.clone(),
            file_type: record.file_type.to_string(),
            category: record.category(),
            size: record.size,
            formatted_size: format_file_size(record.size),
            last_modified: record.last_modified,
            is_project: record.is_project.unwrap_or(false),
            preview_path: record.preview_path.clone(),
            tags: record.tags.clone(),
        }
    }
}

/// Creates the complete `UiState` from the current `AppState`.
pub fn generate_ui_state(state: &AppState) -> UiState {
    let counts = category_counts(&state.all_files);
    let mut categories = vec![CategoryEntry {
        id: CategoryFilter::All,
        count: state.all_files.len(),
    }];
    categories.extend(counts.into_iter().map(|(category, count)| CategoryEntry {
        id: CategoryFilter::Only(category),
        count,
    }));

    let vocabulary = state
        .current_category
        .category()
        .and_then(|category| state.vocabularies.get(&category))
        .cloned()
        .unwrap_or_default();

    let status_message = if state.config.storage_path.is_none() {
        "Choose a storage folder to get started.".to_string()
    } else if state.is_importing {
        "Importing...".to_string()
    } else {
        state.status_message.clone()
    };

    UiState {
        storage_path: state.config.storage_path.clone(),
        current_category: state.current_category,
        search_query: state.search_query.clone(),
        search_includes_tags: state.config.search_includes_tags,
        categories,
        cards: state.visible_files.iter().map(FileCard::from).collect(),
        vocabulary,
        selected_tags: state.current_selected_tags(),
        is_importing: state.is_importing,
        status_message,
    }
}
