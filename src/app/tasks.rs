//! Long-running work triggered by commands: rescanning the storage root,
//! imports, and the debounced search.
//!
//! None of these hold the state lock across an `.await`: they copy what they
//! need out of the state, do the I/O, then lock again to publish the result.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::events::UserEvent;
use super::filtering::apply_filters;
use super::helpers::{lock_state, notify, report_error};
use super::proxy::EventProxy;
use super::state::AppState;
use crate::config::AppConfig;
use crate::core::download::UrlImporter;
use crate::core::importer::{decode_data_url, import_clipboard_image};
use crate::core::{
    import_paths, load_existing, Category, CoreResult, FileRecord, ImportDestination, JsonTagStore,
    TagStore,
};

/// Everything read from disk for one storage root.
struct StorageSnapshot {
    files: Vec<FileRecord>,
    vocabularies: HashMap<Category, Vec<String>>,
    file_tags: HashMap<Category, HashMap<PathBuf, Vec<String>>>,
}

async fn load_snapshot(root: &Path) -> CoreResult<StorageSnapshot> {
    let files = load_existing(root).await?;
    let store = JsonTagStore::new(root);
    let mut vocabularies = HashMap::new();
    let mut file_tags = HashMap::new();
    for category in Category::ALL {
        vocabularies.insert(category, store.vocabulary(category).await);
        file_tags.insert(category, store.all_file_tags(category).await);
    }
    Ok(StorageSnapshot {
        files,
        vocabularies,
        file_tags,
    })
}

/// Rebuilds the file list and tag caches from the storage root, re-runs the
/// filters and sends the new state to the UI.
pub async fn reload_files<P: EventProxy>(proxy: &P, state: &Arc<Mutex<AppState>>) {
    let root = lock_state(state).storage_root();
    let root = match root {
        Ok(root) => root,
        Err(e) => {
            notify(&lock_state(state), proxy);
            report_error(proxy, "Cannot load files", e);
            return;
        }
    };

    let snapshot = load_snapshot(&root).await;

    let mut state_guard = lock_state(state);
    if state_guard.config.storage_path() != Some(root.as_path()) {
        tracing::warn!("Storage folder changed during reload. Discarding results.");
        return;
    }
    match snapshot {
        Ok(snapshot) => {
            state_guard.all_files = snapshot.files;
            state_guard.vocabularies = snapshot.vocabularies;
            state_guard.file_tags = snapshot.file_tags;
            apply_filters(&mut state_guard);
            notify(&state_guard, proxy);
        }
        Err(e) => {
            notify(&state_guard, proxy);
            drop(state_guard);
            report_error(proxy, "Cannot load files", e);
        }
    }
}

/// Applies `query` once no newer keystroke arrived within the debounce delay.
pub fn schedule_search<P: EventProxy>(query: String, proxy: P, state: Arc<Mutex<AppState>>) {
    let mut state_guard = lock_state(&state);
    state_guard.cancel_search_task();
    let delay = state_guard.config.search_debounce();

    let task_state = state.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let mut state_guard = lock_state(&task_state);
        state_guard.search_task = None;
        state_guard.search_query = query;
        apply_filters(&mut state_guard);
        notify(&state_guard, &proxy);
    });
    state_guard.search_task = Some(handle);
}

/// Marks an import as running. `None` when there is no storage folder or
/// another import is still going.
fn begin_import<P: EventProxy>(
    proxy: &P,
    state: &Arc<Mutex<AppState>>,
) -> Option<(PathBuf, AppConfig)> {
    let mut state_guard = lock_state(state);
    let root = match state_guard.storage_root() {
        Ok(root) => root,
        Err(e) => {
            drop(state_guard);
            report_error(proxy, "Cannot import", e);
            return None;
        }
    };
    if state_guard.is_importing {
        drop(state_guard);
        report_error(proxy, "Cannot import", "another import is still running");
        return None;
    }
    state_guard.is_importing = true;
    notify(&state_guard, proxy);
    Some((root, state_guard.config.clone()))
}

async fn finish_import<P: EventProxy>(proxy: &P, state: &Arc<Mutex<AppState>>, message: String) {
    {
        let mut state_guard = lock_state(state);
        state_guard.is_importing = false;
        state_guard.status_message = message;
    }
    reload_files(proxy, state).await;
}

/// Imports local paths, then rescans.
pub async fn run_import<P: EventProxy>(
    sources: Vec<PathBuf>,
    destination: ImportDestination,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some((root, _)) = begin_import(&proxy, &state) else {
        return;
    };
    let imported = import_paths(&root, &sources, destination).await;
    if imported.is_empty() && !sources.is_empty() {
        proxy.send_event(UserEvent::ShowError(
            "Nothing was imported. Unsupported or unreadable items were skipped.".to_string(),
        ));
    }
    let message = format!(
        "Imported {} of {} item(s).",
        imported.len(),
        sources.len()
    );
    finish_import(&proxy, &state, message).await;
}

async fn download(root: &Path, config: &AppConfig, url: &str) -> CoreResult<FileRecord> {
    let importer = UrlImporter::new(
        config.reachability_probe_url.clone(),
        config.network_timeout(),
    )?;
    importer.import_url(root, url).await
}

async fn paste(root: &Path, data_url: &str) -> CoreResult<FileRecord> {
    let (mime, bytes) = decode_data_url(data_url)?;
    import_clipboard_image(root, &bytes, &mime).await
}

/// Downloads a URL into the storage root, then rescans.
pub async fn run_url_import<P: EventProxy>(url: String, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some((root, config)) = begin_import(&proxy, &state) else {
        return;
    };
    let result = download(&root, &config, url.trim()).await;

    let message = match result {
        Ok(record) => format!("Downloaded {}.", record.name),
        Err(e) => {
            report_error(&proxy, "Download failed", &e);
            format!("Download failed: {e}")
        }
    };
    finish_import(&proxy, &state, message).await;
}

/// Saves a pasted image (as a `data:` URL) into the storage root, then rescans.
pub async fn run_clipboard_import<P: EventProxy>(
    data_url: String,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some((root, _)) = begin_import(&proxy, &state) else {
        return;
    };
    let result = paste(&root, &data_url).await;

    let message = match result {
        Ok(record) => format!("Pasted image saved as {}.", record.name),
        Err(e) => {
            report_error(&proxy, "Paste failed", &e);
            format!("Paste failed: {e}")
        }
    };
    finish_import(&proxy, &state, message).await;
}
