//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// This enum encapsulates everything that can go wrong while classifying,
/// importing, scanning or tagging files under a storage root.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No storage directory has been chosen yet. The user has to pick one
    /// before anything can be imported or tagged.
    #[error("No storage path is set. Please choose a storage folder first.")]
    StorageNotConfigured,

    /// Represents an I/O error, typically from file system operations.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// The path does not exist (anymore).
    #[error("Path does not exist: {0}")]
    NotFound(PathBuf),

    /// A file extension that does not map to any category.
    #[error("Unsupported file type: '{0}'")]
    Unclassified(String),

    /// A JSON sidecar file could not be read or written.
    #[error("Invalid JSON in {1}: {0}")]
    Json(#[source] serde_json::Error, PathBuf),

    /// A tag name that is empty, duplicated or unknown.
    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    /// The reachability probe failed before a download.
    #[error("No network connection")]
    Offline,

    /// Transport-level failure while downloading.
    #[error("Download failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with something other than `200 OK`.
    #[error("Download failed with status code {0}")]
    HttpStatus(u16),

    /// The URL has no usable file name.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A clipboard payload that is not a supported image.
    #[error("Unsupported clipboard payload: {0}")]
    InvalidPayload(String),

    /// Represents an error that occurred when a Tokio task was joined.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl CoreError {
    /// Wraps an `io::Error` with the path it happened on, mapping
    /// `NotFound` to the dedicated variant.
    pub fn io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            CoreError::NotFound(path)
        } else {
            CoreError::Io(err, path)
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
