//! The filter pipeline that turns the full file list into the visible set.
//!
//! Three stages run in a fixed order, each narrowing the previous result:
//! category, free-text search, then tag intersection. Input order is kept.

use super::{Category, CategoryFilter, FileRecord};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

/// Everything the pipeline needs besides the files themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterQuery {
    pub category: CategoryFilter,
    pub search_term: String,
    /// The selected tags of the current category. Ignored for
    /// [`CategoryFilter::All`].
    pub selected_tags: Vec<String>,
    /// Whether the search stage also matches against tag text.
    pub search_includes_tags: bool,
}

impl FilterQuery {
    pub fn new(category: CategoryFilter) -> Self {
        Self {
            category,
            ..Default::default()
        }
    }

    fn active_tags(&self) -> Option<(Category, &[String])> {
        match self.category {
            CategoryFilter::Only(category) if !self.selected_tags.is_empty() => {
                Some((category, self.selected_tags.as_slice()))
            }
            _ => None,
        }
    }
}

fn matches_category(file: &FileRecord, filter: CategoryFilter) -> bool {
    match filter {
        CategoryFilter::All => true,
        CategoryFilter::Only(category) => file.category() == Some(category),
    }
}

fn matches_search(file: &FileRecord, needle: &str, tags: Option<&[String]>) -> bool {
    if file.name.to_lowercase().contains(needle) {
        return true;
    }
    let type_text = file.file_type.as_str().trim_start_matches('.').to_lowercase();
    if type_text.contains(needle) {
        return true;
    }
    tags.is_some_and(|tags| tags.iter().any(|tag| tag.to_lowercase().contains(needle)))
}

/// Computes the visible subset of `files` for `query`.
///
/// `tag_lookup` returns the authoritative tags of a file within a category;
/// it is only consulted by the tag stage and, when enabled, the search stage.
pub fn compute_visible<F>(files: &[FileRecord], query: &FilterQuery, tag_lookup: F) -> Vec<FileRecord>
where
    F: Fn(Category, &Path) -> Vec<String> + Sync,
{
    let needle = query.search_term.trim().to_lowercase();
    let active_tags = query.active_tags();

    files
        .par_iter()
        .filter(|file| matches_category(file, query.category))
        .filter(|file| {
            if needle.is_empty() {
                return true;
            }
            let tags = if query.search_includes_tags {
                file.category().map(|category| tag_lookup(category, &file.path))
            } else {
                None
            };
            matches_search(file, &needle, tags.as_deref())
        })
        .filter(|file| match active_tags {
            Some((category, selected)) => {
                let tags = tag_lookup(category, &file.path);
                selected.iter().all(|wanted| tags.contains(wanted))
            }
            None => true,
        })
        .cloned()
        .collect()
}

/// Number of files per category, over the unfiltered list.
///
/// Every category is present, with zero when it holds no files.
pub fn category_counts(files: &[FileRecord]) -> BTreeMap<Category, usize> {
    let mut counts: BTreeMap<Category, usize> =
        Category::ALL.into_iter().map(|category| (category, 0)).collect();
    for category in files.iter().filter_map(FileRecord::category) {
        *counts.entry(category).or_insert(0) += 1;
    }
    counts
}
