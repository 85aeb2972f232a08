//! Importing a single file from a URL.
//!
//! A cheap reachability probe runs first; the download itself is streamed
//! chunk by chunk into a temporary file in the category folder the URL's
//! file name classifies into, then renamed into place. A failed transfer
//! leaves neither a partial file nor a damaged earlier download behind.

use super::error::{CoreError, CoreResult};
use super::scanner::describe;
use super::{FileRecord, FileType};
use reqwest::{Client, StatusCode, Url};
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

/// Downloads remote files into the storage root.
#[derive(Debug, Clone)]
pub struct UrlImporter {
    client: Client,
    probe_url: String,
    probe_timeout: Duration,
}

impl UrlImporter {
    /// `timeout` bounds the probe and connection setup, not the transfer.
    pub fn new(probe_url: impl Into<String>, timeout: Duration) -> CoreResult<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .user_agent(concat!("material-vault/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, probe_url, timeout))
    }

    pub fn with_client(client: Client, probe_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            probe_url: probe_url.into(),
            probe_timeout: timeout,
        }
    }

    /// Whether the probe URL answers at all. Any HTTP response counts.
    pub async fn is_online(&self) -> bool {
        match self
            .client
            .head(&self.probe_url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => {
                tracing::debug!("Reachability probe answered {}", response.status());
                true
            }
            Err(e) => {
                tracing::warn!("Reachability probe to {} failed: {}", self.probe_url, e);
                false
            }
        }
    }

    /// Downloads `url` into `<storage_root>/<category folder>/<file name>`.
    pub async fn import_url(&self, storage_root: &Path, url: &str) -> CoreResult<FileRecord> {
        if !self.is_online().await {
            return Err(CoreError::Offline);
        }

        let file_name = file_name_from_url(url)?;
        let file_type = FileType::from_path(Path::new(&file_name));
        let category = file_type
            .category()
            .ok_or_else(|| CoreError::Unclassified(file_type.to_string()))?;

        let target_dir = storage_root.join(category.folder_name());
        tokio::fs::create_dir_all(&target_dir)
            .await
            .map_err(|e| CoreError::io(e, &target_dir))?;
        let target = target_dir.join(&file_name);

        self.stream_to(url, &target_dir, &target).await?;

        tracing::info!("Downloaded {} -> {}", url, target.display());
        describe(&target, file_type).await
    }

    /// Streams the body into a temporary file next to `target` and moves it
    /// into place once complete. On any failure the temporary file is
    /// dropped and an existing `target` stays untouched.
    async fn stream_to(&self, url: &str, target_dir: &Path, target: &Path) -> CoreResult<()> {
        let mut response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(CoreError::HttpStatus(response.status().as_u16()));
        }

        let staging = NamedTempFile::new_in(target_dir).map_err(|e| CoreError::io(e, target_dir))?;
        let handle = staging
            .as_file()
            .try_clone()
            .map_err(|e| CoreError::io(e, staging.path()))?;
        let mut file = tokio::fs::File::from_std(handle);
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| CoreError::io(e, staging.path()))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| CoreError::io(e, staging.path()))?;
        drop(file);

        staging
            .persist(target)
            .map_err(|e| CoreError::io(e.error, target))?;
        tracing::debug!("Wrote {} bytes to {}", written, target.display());
        Ok(())
    }
}

/// The last path segment of `url`, which must look like a file name.
pub fn file_name_from_url(url: &str) -> CoreResult<String> {
    let parsed = Url::parse(url).map_err(|e| CoreError::InvalidUrl(format!("{url}: {e}")))?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CoreError::InvalidUrl(format!("{url}: no file name")))
}
