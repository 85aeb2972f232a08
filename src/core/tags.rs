//! Per-category tag vocabularies and per-file tag assignments.
//!
//! [`TagStore`] is the seam to the persistence collaborator. [`JsonTagStore`]
//! keeps two JSON files per category in `<storage root>/config/`:
//!
//! - `<category>-tags.json`: the vocabulary, a JSON array of strings.
//! - `<category>-file-tags.json`: an object keyed by the base64 encoding of
//!   the file's path relative to the storage root, each value being
//!   `{ "path": "<relative path>", "tags": [...] }`.
//!
//! The vocabulary operations at the bottom of this module cascade renames and
//! deletions into every file assignment. The cascade is not atomic: a crash
//! halfway leaves some files updated and others not.

use super::error::{CoreError, CoreResult};
use super::{Category, FileRecord};
use crate::utils::atomic_write::write_json_atomic;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Name of the directory below the storage root that holds the sidecar files.
pub const CONFIG_DIR: &str = "config";

/// Access to tag vocabularies and file tag assignments.
///
/// Reads never fail: missing or unreadable data reads as "no tags".
#[async_trait]
pub trait TagStore: Send + Sync {
    async fn vocabulary(&self, category: Category) -> Vec<String>;

    async fn set_vocabulary(&self, category: Category, tags: &[String]) -> CoreResult<()>;

    async fn file_tags(&self, category: Category, path: &Path) -> Vec<String>;

    async fn set_file_tags(&self, category: Category, path: &Path, tags: &[String])
        -> CoreResult<()>;

    /// Every assignment of the category, keyed by absolute path.
    async fn all_file_tags(&self, category: Category) -> HashMap<PathBuf, Vec<String>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FileTagEntry {
    path: String,
    tags: Vec<String>,
}

type FileTagMap = BTreeMap<String, FileTagEntry>;

/// JSON sidecar files under the storage root.
#[derive(Debug, Clone)]
pub struct JsonTagStore {
    storage_root: PathBuf,
}

impl JsonTagStore {
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
        }
    }

    /// Builds a store for the configured storage root.
    pub fn for_storage(storage_root: Option<&Path>) -> CoreResult<Self> {
        storage_root
            .map(Self::new)
            .ok_or(CoreError::StorageNotConfigured)
    }

    fn config_dir(&self) -> PathBuf {
        self.storage_root.join(CONFIG_DIR)
    }

    fn vocabulary_path(&self, category: Category) -> PathBuf {
        self.config_dir()
            .join(format!("{}-tags.json", category.as_str()))
    }

    fn file_tags_path(&self, category: Category) -> PathBuf {
        self.config_dir()
            .join(format!("{}-file-tags.json", category.as_str()))
    }

    /// The path relative to the storage root, as stored in the sidecar file.
    fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.storage_root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string()
    }

    /// The opaque key of a file in the assignment map.
    pub fn file_key(&self, path: &Path) -> String {
        STANDARD.encode(self.relative_path(path))
    }

    async fn read_json<T>(path: &Path) -> CoreResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CoreError::io(e, path)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| CoreError::Json(e, path.to_path_buf()))
    }

    async fn write_json<T>(path: PathBuf, value: T) -> CoreResult<()>
    where
        T: Serialize + Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            write_json_atomic(&path, &value).map_err(|e| CoreError::io(e, &path))
        })
        .await?
    }

    async fn load_file_tag_map(&self, category: Category) -> FileTagMap {
        let path = self.file_tags_path(category);
        match Self::read_json::<FileTagMap>(&path).await {
            Ok(map) => map.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Ignoring unreadable file tags: {}", e);
                FileTagMap::new()
            }
        }
    }
}

#[async_trait]
impl TagStore for JsonTagStore {
    async fn vocabulary(&self, category: Category) -> Vec<String> {
        let path = self.vocabulary_path(category);
        match Self::read_json::<Vec<String>>(&path).await {
            Ok(tags) => tags.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Ignoring unreadable tag vocabulary: {}", e);
                Vec::new()
            }
        }
    }

    async fn set_vocabulary(&self, category: Category, tags: &[String]) -> CoreResult<()> {
        Self::write_json(self.vocabulary_path(category), tags.to_vec()).await?;
        tracing::info!("Saved {} tags for category '{}'", tags.len(), category);
        Ok(())
    }

    async fn file_tags(&self, category: Category, path: &Path) -> Vec<String> {
        let key = self.file_key(path);
        self.load_file_tag_map(category)
            .await
            .remove(&key)
            .map(|entry| entry.tags)
            .unwrap_or_default()
    }

    async fn set_file_tags(
        &self,
        category: Category,
        path: &Path,
        tags: &[String],
    ) -> CoreResult<()> {
        let mut map = self.load_file_tag_map(category).await;
        map.insert(
            self.file_key(path),
            FileTagEntry {
                path: self.relative_path(path),
                tags: tags.to_vec(),
            },
        );
        Self::write_json(self.file_tags_path(category), map).await?;
        tracing::debug!("Saved tags {:?} for {}", tags, path.display());
        Ok(())
    }

    async fn all_file_tags(&self, category: Category) -> HashMap<PathBuf, Vec<String>> {
        self.load_file_tag_map(category)
            .await
            .into_values()
            .map(|entry| (self.storage_root.join(entry.path), entry.tags))
            .collect()
    }
}

fn normalize_tag_name(name: &str) -> CoreResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidTag("Tag name cannot be empty".to_string()));
    }
    Ok(name.to_string())
}

/// Adds `name` to the vocabulary of `category`. Existing names are left alone.
/// Returns the resulting vocabulary.
pub async fn add_tag<S>(store: &S, category: Category, name: &str) -> CoreResult<Vec<String>>
where
    S: TagStore + ?Sized,
{
    let name = normalize_tag_name(name)?;
    let mut vocabulary = store.vocabulary(category).await;
    if vocabulary.contains(&name) {
        return Ok(vocabulary);
    }
    vocabulary.push(name);
    store.set_vocabulary(category, &vocabulary).await?;
    Ok(vocabulary)
}

/// Renames a vocabulary tag in place and rewrites every assignment of the
/// category's files that used the old name.
pub async fn rename_tag<S>(
    store: &S,
    category: Category,
    old: &str,
    new: &str,
    files: &[FileRecord],
) -> CoreResult<Vec<String>>
where
    S: TagStore + ?Sized,
{
    let new = normalize_tag_name(new)?;
    let mut vocabulary = store.vocabulary(category).await;
    if new == old {
        return Ok(vocabulary);
    }
    if vocabulary.contains(&new) {
        return Err(CoreError::InvalidTag(format!("Tag '{new}' already exists")));
    }
    let Some(index) = vocabulary.iter().position(|tag| tag == old) else {
        return Err(CoreError::InvalidTag(format!("Unknown tag '{old}'")));
    };
    vocabulary[index] = new.clone();

    let mut updated = 0;
    for file in files.iter().filter(|f| f.category() == Some(category)) {
        let tags = store.file_tags(category, &file.path).await;
        if tags.iter().any(|tag| tag == old) {
            let renamed: Vec<String> = tags
                .into_iter()
                .map(|tag| if tag == old { new.clone() } else { tag })
                .collect();
            store.set_file_tags(category, &file.path, &renamed).await?;
            updated += 1;
        }
    }

    store.set_vocabulary(category, &vocabulary).await?;
    tracing::info!(
        "Renamed tag '{}' to '{}' in '{}' ({} files updated)",
        old,
        new,
        category,
        updated
    );
    Ok(vocabulary)
}

/// Removes a vocabulary tag and strips it from every file of the category.
pub async fn delete_tag<S>(
    store: &S,
    category: Category,
    name: &str,
    files: &[FileRecord],
) -> CoreResult<Vec<String>>
where
    S: TagStore + ?Sized,
{
    let mut vocabulary = store.vocabulary(category).await;
    vocabulary.retain(|tag| tag != name);
    store.set_vocabulary(category, &vocabulary).await?;

    let mut updated = 0;
    for file in files.iter().filter(|f| f.category() == Some(category)) {
        let mut tags = store.file_tags(category, &file.path).await;
        if tags.iter().any(|tag| tag == name) {
            tags.retain(|tag| tag != name);
            store.set_file_tags(category, &file.path, &tags).await?;
            updated += 1;
        }
    }

    tracing::info!(
        "Deleted tag '{}' from '{}' ({} files updated)",
        name,
        category,
        updated
    );
    Ok(vocabulary)
}
