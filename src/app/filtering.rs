//! This module is responsible for mutating the application state by applying filters.
//!
//! It runs the core filter pipeline over `AppState::all_files` with the current
//! category, search term and tag selection, answering tag lookups from the
//! state's tag cache, and stores the result in `AppState::visible_files`.

use crate::app::state::AppState;
use crate::core::{compute_visible, Category, FilterQuery};
use std::path::Path;

/// Applies all current filters to the full file list to generate the visible list.
///
/// The visible records carry a display copy of their tags.
pub fn apply_filters(state: &mut AppState) {
    let query = FilterQuery {
        category: state.current_category,
        search_term: state.search_query.clone(),
        selected_tags: state.current_selected_tags(),
        search_includes_tags: state.config.search_includes_tags,
    };

    let lookup = |category: Category, path: &Path| state.tags_of(category, path);
    let mut visible = compute_visible(&state.all_files, &query, lookup);
    for record in &mut visible {
        record.tags = record
            .category()
            .map(|category| state.tags_of(category, &record.path))
            .unwrap_or_default();
    }
    state.visible_files = visible;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CategoryFilter, FileRecord, FileType};
    use chrono::Utc;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn record(path: &str) -> FileRecord {
        let path = PathBuf::from(path);
        FileRecord {
            name: path.file_name().unwrap().to_string_lossy().to_string(),
            file_type: FileType::from_path(&path),
            path,
            size: 1,
            last_modified: Utc::now(),
            is_project: None,
            preview_path: None,
            tags: Vec::new(),
        }
    }

    fn state_with_notes() -> AppState {
        let mut state = AppState::default();
        state.all_files = vec![
            record("/vault/notes/a.md"),
            record("/vault/notes/b.md"),
            record("/vault/images/c.png"),
        ];
        state.file_tags.insert(
            Category::Notes,
            HashMap::from([(
                PathBuf::from("/vault/notes/a.md"),
                vec!["draft".to_string()],
            )]),
        );
        state
    }

    fn visible_names(state: &AppState) -> Vec<&str> {
        state.visible_files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_all_category_shows_everything_with_tags_attached() {
        let mut state = state_with_notes();
        apply_filters(&mut state);
        assert_eq!(visible_names(&state), vec!["a.md", "b.md", "c.png"]);
        assert_eq!(state.visible_files[0].tags, vec!["draft"]);
        assert!(state.visible_files[1].tags.is_empty());
    }

    #[test]
    fn test_tag_selection_narrows_the_current_category() {
        let mut state = state_with_notes();
        state.current_category = CategoryFilter::Only(Category::Notes);
        state.toggle_selected_tag("draft");
        apply_filters(&mut state);
        assert_eq!(visible_names(&state), vec!["a.md"]);
    }

    #[test]
    fn test_search_can_include_tags() {
        let mut state = state_with_notes();
        state.search_query = "DRAFT".to_string();
        apply_filters(&mut state);
        assert!(state.visible_files.is_empty());

        state.config.search_includes_tags = true;
        apply_filters(&mut state);
        assert_eq!(visible_names(&state), vec!["a.md"]);
    }
}
