//! The import orchestrator: copies files and folders into their category
//! folder under the storage root and returns the resulting records.
//!
//! Every source path is handled on its own. A failing or unclassified path is
//! logged and left out of the result; it never aborts the batch.

use super::error::{CoreError, CoreResult};
use super::project::is_code_project;
use super::scanner::describe;
use super::{Category, FileRecord, FileType};
use crate::utils::file_detection::photo_extension_for_mime;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

/// Where an import should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportDestination {
    /// Files go where their extension says; directories go to `code` when
    /// they look like a project and to `folders` otherwise.
    #[default]
    Auto,
    /// The category the user imported into. Only `code` changes anything:
    /// directories imported there always land in `code`.
    Category(Category),
}

/// Imports every path in `sources` and returns the records that made it.
pub async fn import_paths(
    storage_root: &Path,
    sources: &[PathBuf],
    destination: ImportDestination,
) -> Vec<FileRecord> {
    let mut imported = Vec::with_capacity(sources.len());
    for source in sources {
        match import_one(storage_root, source, destination).await {
            Ok(Some(record)) => {
                tracing::info!("Imported {} -> {}", source.display(), record.path.display());
                imported.push(record);
            }
            Ok(None) => {}
            Err(e) => tracing::error!("Failed to import {}: {}", source.display(), e),
        }
    }
    tracing::info!(
        "Import finished: {} of {} item(s) imported",
        imported.len(),
        sources.len()
    );
    imported
}

async fn import_one(
    storage_root: &Path,
    source: &Path,
    destination: ImportDestination,
) -> CoreResult<Option<FileRecord>> {
    let metadata = tokio::fs::symlink_metadata(source)
        .await
        .map_err(|e| CoreError::io(e, source))?;
    let Some(name) = source.file_name() else {
        return Err(CoreError::NotFound(source.to_path_buf()));
    };

    if metadata.file_type().is_symlink() {
        tracing::warn!("Skipping symbolic link {}", source.display());
        return Ok(None);
    }

    if metadata.is_dir() {
        let to_code = match destination {
            ImportDestination::Category(Category::Code) => true,
            ImportDestination::Category(_) => false,
            ImportDestination::Auto => is_code_project(source).await,
        };
        let category = if to_code { Category::Code } else { Category::Folders };
        let target = storage_root.join(category.folder_name()).join(name);

        copy_dir_replacing(source, &target).await?;

        let file_type = if to_code && is_code_project(&target).await {
            FileType::Project
        } else {
            FileType::Folder
        };
        let mut record = describe(&target, file_type).await?;
        if to_code {
            record.is_project = Some(record.file_type == FileType::Project);
        }
        return Ok(Some(record));
    }

    let file_type = FileType::from_path(source);
    let Some(category) = file_type.category() else {
        tracing::warn!(
            "Skipping {}: unsupported file type '{}'",
            source.display(),
            file_type
        );
        return Ok(None);
    };

    let target_dir = storage_root.join(category.folder_name());
    tokio::fs::create_dir_all(&target_dir)
        .await
        .map_err(|e| CoreError::io(e, &target_dir))?;
    let target = target_dir.join(name);
    if !same_path(source, &target).await {
        tokio::fs::copy(source, &target)
            .await
            .map_err(|e| CoreError::io(e, &target))?;
    }
    describe(&target, file_type).await.map(Some)
}

async fn same_path(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Replaces `target` with a full copy of `source`.
async fn copy_dir_replacing(source: &Path, target: &Path) -> CoreResult<()> {
    if same_path(source, target).await {
        return Ok(());
    }
    let parent = target.parent().unwrap_or(target);
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| CoreError::io(e, parent))?;
    let source_real = tokio::fs::canonicalize(source)
        .await
        .map_err(|e| CoreError::io(e, source))?;
    let parent_real = tokio::fs::canonicalize(parent)
        .await
        .map_err(|e| CoreError::io(e, parent))?;
    if parent_real.starts_with(&source_real) {
        return Err(CoreError::Io(
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot import a folder into itself",
            ),
            target.to_path_buf(),
        ));
    }

    if tokio::fs::symlink_metadata(target).await.is_ok() {
        tracing::debug!("Replacing existing {}", target.display());
        remove_path(target)
            .await
            .map_err(|e| CoreError::io(e, target))?;
    }

    let (source, target) = (source.to_path_buf(), target.to_path_buf());
    tokio::task::spawn_blocking(move || copy_dir_recursive(&source, &target)).await?
}

/// Copies the directory tree at `source` to `target`, which must not exist
/// yet. Empty directories are recreated; symbolic links are skipped.
pub fn copy_dir_recursive(source: &Path, target: &Path) -> CoreResult<()> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            CoreError::io(io::Error::other(e), path)
        })?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let dest = target.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            std::fs::create_dir_all(&dest).map_err(|e| CoreError::io(e, &dest))?;
        } else if file_type.is_file() {
            std::fs::copy(entry.path(), &dest).map_err(|e| CoreError::io(e, &dest))?;
        } else {
            tracing::warn!("Not copying {}: not a regular file", entry.path().display());
        }
    }
    Ok(())
}

/// Sum of the sizes of all regular files below `dir`. Unreadable entries
/// count as zero.
pub fn dir_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}

async fn remove_path(path: &Path) -> io::Result<()> {
    let metadata = tokio::fs::symlink_metadata(path).await?;
    if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    }
}

/// Deletes a file or a whole directory tree.
///
/// Directory removal is retried `retries` times, `delay` apart, to ride out
/// transient "resource busy" errors. Returns `false` when the path does not
/// exist or could not be removed.
pub async fn delete_path(path: &Path, retries: u32, delay: Duration) -> bool {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!("Cannot delete {}: {}", path.display(), e);
            return false;
        }
    };

    if !metadata.is_dir() {
        return match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::info!("Deleted {}", path.display());
                true
            }
            Err(e) => {
                tracing::error!("Failed to delete {}: {}", path.display(), e);
                false
            }
        };
    }

    let mut attempt = 0;
    loop {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => {
                tracing::info!("Deleted folder {}", path.display());
                return true;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => return true,
            Err(e) if attempt < retries => {
                attempt += 1;
                tracing::debug!(
                    "Retrying delete of {} ({}/{}): {}",
                    path.display(),
                    attempt,
                    retries,
                    e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::error!("Failed to delete folder {}: {}", path.display(), e);
                return false;
            }
        }
    }
}

/// Splits a `data:<mime>;base64,<payload>` URL into its MIME type and bytes.
pub fn decode_data_url(data_url: &str) -> CoreResult<(String, Vec<u8>)> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| CoreError::InvalidPayload("not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CoreError::InvalidPayload("missing payload".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| CoreError::InvalidPayload("payload is not base64".to_string()))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| CoreError::InvalidPayload(e.to_string()))?;
    Ok((mime.to_string(), bytes))
}

/// Writes a pasted image to `images/clipboard_<timestamp><ext>`.
pub async fn import_clipboard_image(
    storage_root: &Path,
    bytes: &[u8],
    mime: &str,
) -> CoreResult<FileRecord> {
    let Some(extension) = photo_extension_for_mime(mime) else {
        return Err(CoreError::InvalidPayload(format!(
            "'{mime}' is not a supported image type"
        )));
    };
    if bytes.is_empty() {
        return Err(CoreError::InvalidPayload("empty image".to_string()));
    }

    let dir = storage_root.join(Category::Photos.folder_name());
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| CoreError::io(e, &dir))?;
    let name = format!(
        "clipboard_{}{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S"),
        extension
    );
    let target = dir.join(name);
    tokio::fs::write(&target, bytes)
        .await
        .map_err(|e| CoreError::io(e, &target))?;
    tracing::info!("Saved clipboard image to {}", target.display());

    describe(&target, FileType::Extension(extension)).await
}
