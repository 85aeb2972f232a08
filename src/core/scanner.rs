//! Rebuilds the in-memory file list from the category folders of the
//! storage root.

use super::error::{CoreError, CoreResult};
use super::importer::dir_size;
use super::project::is_code_project;
use super::{Category, FileRecord, FileType};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Builds the record for a path that is already in the storage root.
///
/// Directory sizes are recursive sums. `is_project` is left unset; callers
/// that ran the project detector fill it in.
pub(crate) async fn describe(path: &Path, file_type: FileType) -> CoreResult<FileRecord> {
    let metadata = tokio::fs::symlink_metadata(path)
        .await
        .map_err(|e| CoreError::io(e, path))?;

    let size = if metadata.is_dir() {
        let dir = path.to_path_buf();
        tokio::task::spawn_blocking(move || dir_size(&dir)).await?
    } else {
        metadata.len()
    };
    let last_modified: DateTime<Utc> = metadata
        .modified()
        .map(DateTime::from)
        .unwrap_or_else(|_| Utc::now());

    Ok(FileRecord {
        path: path.to_path_buf(),
        name: path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default(),
        size,
        file_type,
        last_modified,
        is_project: None,
        preview_path: None,
        tags: Vec::new(),
    })
}

/// Scans every category folder of `storage_root`, creating missing ones.
///
/// Output is in category order, then by name. Entries that do not classify
/// into the folder they live in are skipped, as are symbolic links and
/// anything that cannot be read.
pub async fn load_existing(storage_root: &Path) -> CoreResult<Vec<FileRecord>> {
    let mut records = Vec::new();
    for category in Category::ALL {
        let folder = storage_root.join(category.folder_name());
        tokio::fs::create_dir_all(&folder)
            .await
            .map_err(|e| CoreError::io(e, &folder))?;

        let children = match list_sorted(&folder).await {
            Ok(children) => children,
            Err(e) => {
                tracing::warn!("Cannot list {}: {}", folder.display(), e);
                continue;
            }
        };
        for child in children {
            match scan_entry(category, &child).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping {}: {}", child.display(), e),
            }
        }
    }
    tracing::info!(
        "Loaded {} item(s) from {}",
        records.len(),
        storage_root.display()
    );
    Ok(records)
}

async fn list_sorted(folder: &Path) -> CoreResult<Vec<PathBuf>> {
    let mut children = Vec::new();
    let mut entries = tokio::fs::read_dir(folder)
        .await
        .map_err(|e| CoreError::io(e, folder))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| CoreError::io(e, folder))?
    {
        children.push(entry.path());
    }
    children.sort();
    Ok(children)
}

async fn scan_entry(category: Category, path: &Path) -> CoreResult<Option<FileRecord>> {
    let metadata = tokio::fs::symlink_metadata(path)
        .await
        .map_err(|e| CoreError::io(e, path))?;
    if metadata.file_type().is_symlink() {
        tracing::debug!("Ignoring symbolic link {}", path.display());
        return Ok(None);
    }

    let (file_type, is_project) = if metadata.is_dir() {
        match category {
            Category::Code => {
                let is_project = is_code_project(path).await;
                let file_type = if is_project {
                    FileType::Project
                } else {
                    FileType::Folder
                };
                (file_type, Some(is_project))
            }
            _ => (FileType::Folder, None),
        }
    } else {
        (FileType::from_path(path), None)
    };

    // A plain folder imported into `code` stays listed there; by type it
    // reports the `folders` category.
    let belongs = file_type.category() == Some(category)
        || (category == Category::Code && file_type == FileType::Folder);
    if !belongs {
        tracing::debug!(
            "Ignoring {} in '{}': type '{}' belongs elsewhere",
            path.display(),
            category.folder_name(),
            file_type
        );
        return Ok(None);
    }

    let mut record = describe(path, file_type).await?;
    record.is_project = is_project;
    if record.file_type.as_str() == ".icns" {
        let preview = path.with_extension("png");
        if tokio::fs::try_exists(&preview).await.unwrap_or(false) {
            record.preview_path = Some(preview);
        }
    }
    Ok(Some(record))
}
