//! Text previews and size formatting for the file cards.

use std::path::Path;
use tokio::io::AsyncReadExt;

/// Characters shown in a card preview.
pub const PREVIEW_CHARS: usize = 200;
/// Files above this size only have their head read for a preview.
pub const LARGE_FILE_BYTES: u64 = 1024 * 1024;
const LARGE_FILE_HEAD_BYTES: u64 = 1024;

/// Returns the first [`PREVIEW_CHARS`] characters of a text file.
///
/// Large files are only read up to their first KiB. `None` when the file
/// cannot be read.
pub async fn read_preview(path: &Path) -> Option<String> {
    let result = async {
        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        let mut bytes = Vec::new();
        if len > LARGE_FILE_BYTES {
            file.take(LARGE_FILE_HEAD_BYTES).read_to_end(&mut bytes).await?;
        } else {
            let mut file = file;
            file.read_to_end(&mut bytes).await?;
        }
        Ok::<_, std::io::Error>(bytes)
    }
    .await;

    match result {
        Ok(bytes) => Some(
            String::from_utf8_lossy(&bytes)
                .chars()
                .take(PREVIEW_CHARS)
                .collect(),
        ),
        Err(e) => {
            tracing::warn!("Cannot preview {}: {}", path.display(), e);
            None
        }
    }
}

/// Reads a whole file as UTF-8 text.
pub async fn read_full_content(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Some(content),
        Err(e) => {
            tracing::warn!("Cannot read {}: {}", path.display(), e);
            None
        }
    }
}

/// Formats a byte count with binary units: `0 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut exponent = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && exponent < UNITS.len() - 1 {
        scaled /= 1024;
        exponent += 1;
    }
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exponent])
}
