//! Contains all the command handlers that are callable from the frontend via IPC.
//!
//! Each function in this module corresponds to a specific `IpcMessage::command`.
//! These handlers are responsible for interacting with the `AppState` and the `core`
//! logic, and for sending `UserEvent`s back to the UI.

use super::events::UserEvent;
use super::filtering::apply_filters;
use super::helpers::{
    lock_state, notify, open_path, report_error, reveal_in_folder, with_state_and_notify,
};
use super::proxy::EventProxy;
use super::state::AppState;
use super::tasks::{reload_files, run_clipboard_import, run_import, run_url_import, schedule_search};
use crate::app::file_dialog::DialogService;
use crate::config::AppConfig;
use crate::core::category::dialog_filters;
use crate::core::importer::delete_path;
use crate::core::preview::{read_full_content, read_preview};
use crate::core::tags::{
    add_tag as add_vocabulary_tag, delete_tag as delete_vocabulary_tag,
    rename_tag as rename_vocabulary_tag,
};
use crate::core::{
    project_stats as collect_project_stats, Category, CategoryFilter, CoreError, CoreResult,
    FileType, ImportDestination, TagStore,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Parses a command payload, reporting malformed ones to the user.
fn parse_payload<T: DeserializeOwned, P: EventProxy>(
    command: &str,
    payload: serde_json::Value,
    proxy: &P,
) -> Option<T> {
    match serde_json::from_value::<T>(payload) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            report_error(proxy, &format!("Invalid request '{command}'"), e);
            None
        }
    }
}

#[derive(Deserialize)]
pub struct PathPayload {
    pub path: PathBuf,
}

#[derive(Deserialize)]
pub struct CategoryPayload {
    pub category: CategoryFilter,
}

#[derive(Deserialize)]
pub struct SearchPayload {
    pub query: String,
}

#[derive(Deserialize)]
pub struct TagPayload {
    pub tag: String,
}

#[derive(Deserialize)]
pub struct CategoryTagPayload {
    pub category: CategoryFilter,
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameTagPayload {
    pub category: CategoryFilter,
    pub old_name: String,
    pub new_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTagsPayload {
    /// Derived from the file when absent.
    #[serde(default)]
    pub category: Option<Category>,
    pub path: PathBuf,
    pub tags: Vec<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportDialogPayload {
    /// The category the user imports into; `all` lets extensions decide.
    pub category: CategoryFilter,
    /// Pick folders instead of files.
    pub directories: bool,
}

#[derive(Deserialize)]
pub struct DroppedPayload {
    pub paths: Vec<PathBuf>,
}

#[derive(Deserialize)]
pub struct UrlPayload {
    pub url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardPayload {
    pub data_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewPayload {
    pub path: PathBuf,
    #[serde(default)]
    pub full: bool,
}

/// Tag vocabularies belong to a single category; `all` has none.
fn require_category(filter: CategoryFilter) -> CoreResult<Category> {
    filter
        .category()
        .ok_or_else(|| CoreError::InvalidTag("Tags belong to a single category, not 'all'".into()))
}

/// Handles the initial request for state from the frontend when it loads.
pub async fn initialize<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let configured = {
        let state_guard = lock_state(&state);
        notify(&state_guard, &proxy);
        state_guard.config.storage_path.is_some()
    };
    if configured {
        reload_files(&proxy, &state).await;
    }
}

/// Lets the user choose the storage folder, persists it and loads its content.
pub async fn select_storage_path<P: EventProxy, D: DialogService + ?Sized>(
    dialog: &D,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let start = lock_state(&state)
        .config
        .storage_path
        .clone()
        .or_else(AppConfig::suggested_storage_path);

    let Some(path) = dialog.pick_directory(start.as_deref()) else {
        tracing::info!("User cancelled storage folder selection.");
        return;
    };

    if let Err(e) = tokio::fs::create_dir_all(&path).await {
        report_error(&proxy, "Cannot use this storage folder", e);
        return;
    }

    {
        let mut state_guard = lock_state(&state);
        state_guard.reset_storage_state();
        state_guard.config.storage_path = Some(path.clone());
        state_guard.status_message = format!("Storage folder: {}", path.display());
        state_guard.save_config();
    }
    tracing::info!("Storage folder set to {}", path.display());
    reload_files(&proxy, &state).await;
}

/// Rescans the storage folder.
pub async fn load_files<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    reload_files(&proxy, &state).await;
}

/// Switches the category filter.
pub fn set_category<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(CategoryPayload { category }) = parse_payload("setCategory", payload, &proxy) else {
        return;
    };
    with_state_and_notify(&state, &proxy, |s| {
        s.current_category = category;
        apply_filters(s);
    });
}

/// Updates the search term after the debounce delay.
pub fn update_search<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(SearchPayload { query }) = parse_payload("updateSearch", payload, &proxy) else {
        return;
    };
    schedule_search(query, proxy, state);
}

/// Selects or deselects a tag filter of the current category.
pub fn toggle_tag_filter<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(TagPayload { tag }) = parse_payload("toggleTagFilter", payload, &proxy) else {
        return;
    };
    with_state_and_notify(&state, &proxy, |s| {
        if s.toggle_selected_tag(&tag) {
            apply_filters(s);
        } else {
            tracing::debug!("Ignoring tag filter '{}' outside a category", tag);
        }
    });
}

/// Adds a tag to a category's vocabulary.
pub async fn add_tag<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(CategoryTagPayload { category, name }) = parse_payload("addTag", payload, &proxy) else {
        return;
    };
    let result = async {
        let category = require_category(category)?;
        let store = lock_state(&state).tag_store()?;
        add_vocabulary_tag(&store, category, &name).await
    }
    .await;

    match result {
        Ok(_) => reload_files(&proxy, &state).await,
        Err(e) => report_error(&proxy, "Cannot add tag", e),
    }
}

/// Renames a vocabulary tag and every use of it, then rescans.
pub async fn rename_tag<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(RenameTagPayload {
        category,
        old_name,
        new_name,
    }) = parse_payload("renameTag", payload, &proxy)
    else {
        return;
    };
    let result = async {
        let category = require_category(category)?;
        let (store, files) = {
            let state_guard = lock_state(&state);
            (state_guard.tag_store()?, state_guard.all_files.clone())
        };
        rename_vocabulary_tag(&store, category, &old_name, &new_name, &files).await?;
        Ok::<_, CoreError>(category)
    }
    .await;

    match result {
        Ok(category) => {
            lock_state(&state).rename_selected_tag(category, &old_name, new_name.trim());
            reload_files(&proxy, &state).await;
        }
        Err(e) => report_error(&proxy, "Cannot rename tag", e),
    }
}

/// Deletes a vocabulary tag and strips it from every file, then rescans.
pub async fn delete_tag<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(CategoryTagPayload { category, name }) = parse_payload("deleteTag", payload, &proxy) else {
        return;
    };
    let result = async {
        let category = require_category(category)?;
        let (store, files) = {
            let state_guard = lock_state(&state);
            (state_guard.tag_store()?, state_guard.all_files.clone())
        };
        delete_vocabulary_tag(&store, category, &name, &files).await?;
        Ok::<_, CoreError>(category)
    }
    .await;

    match result {
        Ok(category) => {
            lock_state(&state).remove_selected_tag(category, &name);
            reload_files(&proxy, &state).await;
        }
        Err(e) => report_error(&proxy, "Cannot delete tag", e),
    }
}

/// Replaces the tags of one file.
pub async fn set_file_tags<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(FileTagsPayload {
        category,
        path,
        tags,
    }) = parse_payload("setFileTags", payload, &proxy)
    else {
        return;
    };
    let result = async {
        let (store, category) = {
            let state_guard = lock_state(&state);
            let category = match category {
                Some(category) => category,
                None => {
                    let file_type = state_guard
                        .all_files
                        .iter()
                        .find(|record| record.path == path)
                        .map(|record| record.file_type.clone())
                        .unwrap_or_else(|| FileType::from_path(&path));
                    file_type
                        .category()
                        .ok_or_else(|| CoreError::Unclassified(file_type.to_string()))?
                }
            };
            (state_guard.tag_store()?, category)
        };
        store.set_file_tags(category, &path, &tags).await
    }
    .await;

    match result {
        Ok(()) => reload_files(&proxy, &state).await,
        Err(e) => report_error(&proxy, "Cannot save tags", e),
    }
}

/// Opens the native picker and imports what the user chose.
pub async fn import_dialog<P: EventProxy, D: DialogService + ?Sized>(
    payload: serde_json::Value,
    dialog: &D,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let request: ImportDialogPayload = if payload.is_null() {
        ImportDialogPayload::default()
    } else {
        let Some(request) = parse_payload("importDialog", payload, &proxy) else {
            return;
        };
        request
    };

    if let Err(e) = lock_state(&state).storage_root() {
        report_error(&proxy, "Cannot import", e);
        return;
    }

    let category = request.category.category();
    let picked = if request.directories || category == Some(Category::Folders) {
        dialog.pick_folders()
    } else {
        dialog.pick_files(&dialog_filters(category))
    };
    let Some(sources) = picked.filter(|paths| !paths.is_empty()) else {
        tracing::info!("User cancelled import.");
        return;
    };

    let destination = match category {
        Some(category) => ImportDestination::Category(category),
        None => ImportDestination::Auto,
    };
    run_import(sources, destination, proxy, state).await;
}

/// Imports paths dropped onto the window.
pub async fn import_dropped<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(DroppedPayload { paths }) = parse_payload("importDropped", payload, &proxy) else {
        return;
    };
    run_import(paths, ImportDestination::Auto, proxy, state).await;
}

pub async fn import_url<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(UrlPayload { url }) = parse_payload("importUrl", payload, &proxy) else {
        return;
    };
    run_url_import(url, proxy, state).await;
}

pub async fn import_clipboard<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let Some(ClipboardPayload { data_url }) = parse_payload("importClipboard", payload, &proxy)
    else {
        return;
    };
    run_clipboard_import(data_url, proxy, state).await;
}

/// Whether `path` names an entry strictly below `root`.
///
/// `..` components are refused outright. The parent directory is resolved on
/// disk, so a symlinked parent cannot lead outside either; the entry itself
/// is not resolved, so deleting a symlink removes only the link.
async fn is_inside_storage(path: &Path, root: &Path) -> bool {
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return false;
    }
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return false;
    };
    match (
        tokio::fs::canonicalize(root).await,
        tokio::fs::canonicalize(parent).await,
    ) {
        (Ok(root), Ok(parent)) => {
            let resolved = parent.join(name);
            resolved.starts_with(&root) && resolved != root
        }
        _ => false,
    }
}

/// Deletes a file or folder from the storage root, then rescans.
pub async fn delete_file<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(PathPayload { path }) = parse_payload("deleteFile", payload, &proxy) else {
        return;
    };
    let (retries, delay, root) = {
        let state_guard = lock_state(&state);
        (
            state_guard.config.delete_retries,
            state_guard.config.delete_retry_delay(),
            state_guard.storage_root(),
        )
    };
    let inside_storage = match root {
        Ok(root) => is_inside_storage(&path, &root).await,
        Err(_) => false,
    };
    if !inside_storage {
        report_error(
            &proxy,
            "Cannot delete",
            format!("{} is not inside the storage folder", path.display()),
        );
        return;
    }

    if delete_path(&path, retries, delay).await {
        lock_state(&state).status_message = format!("Deleted {}.", path.display());
    } else {
        report_error(&proxy, "Cannot delete", path.display());
    }
    reload_files(&proxy, &state).await;
}

pub fn open_file<P: EventProxy>(payload: serde_json::Value, proxy: P) {
    let Some(PathPayload { path }) = parse_payload("openFile", payload, &proxy) else {
        return;
    };
    if !open_path(&path) {
        report_error(&proxy, "Cannot open", path.display());
    }
}

pub fn reveal_file<P: EventProxy>(payload: serde_json::Value, proxy: P) {
    let Some(PathPayload { path }) = parse_payload("revealFile", payload, &proxy) else {
        return;
    };
    if !reveal_in_folder(&path) {
        report_error(&proxy, "Cannot show in folder", path.display());
    }
}

pub fn open_storage_location<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let root = lock_state(&state).storage_root();
    match root {
        Ok(root) if open_path(&root) => {}
        Ok(root) => report_error(&proxy, "Cannot open", root.display()),
        Err(e) => report_error(&proxy, "Cannot open storage folder", e),
    }
}

/// Sends the head (or, on request, all) of a text file to the preview panel.
pub async fn preview_file<P: EventProxy>(payload: serde_json::Value, proxy: P) {
    let Some(PreviewPayload { path, full }) = parse_payload("previewFile", payload, &proxy) else {
        return;
    };
    let content = if full {
        read_full_content(&path).await
    } else {
        read_preview(&path).await
    };
    match content {
        Some(content) => proxy.send_event(UserEvent::ShowFilePreview {
            path,
            content,
            full,
        }),
        None => report_error(&proxy, "Cannot preview", path.display()),
    }
}

/// Sends source statistics of a code project.
pub async fn project_stats<P: EventProxy>(payload: serde_json::Value, proxy: P) {
    let Some(PathPayload { path }) = parse_payload("projectStats", payload, &proxy) else {
        return;
    };
    let stats = collect_project_stats(&path).await;
    proxy.send_event(UserEvent::ShowProjectStats { path, stats });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::view_model::UiState;
    use crate::core::category::DialogFilter;
    use crate::core::JsonTagStore;
    use serde_json::json;
    use std::fs as std_fs;
    use tempfile::{tempdir, TempDir};
    use tokio::sync::mpsc;

    // A mock EventProxy for capturing events sent to the UI.
    #[derive(Clone)]
    struct TestEventProxy {
        sender: mpsc::UnboundedSender<UserEvent>,
    }

    impl EventProxy for TestEventProxy {
        fn send_event(&self, event: UserEvent) {
            self.sender.send(event).expect("Test receiver dropped");
        }
    }

    #[derive(Default)]
    struct MockDialogService {
        picked_folder: Mutex<Option<PathBuf>>,
        picked_files: Mutex<Option<Vec<PathBuf>>>,
        seen_filters: Mutex<Vec<DialogFilter>>,
        folders_requested: Mutex<bool>,
    }

    impl MockDialogService {
        fn set_pick_folder(&self, path: Option<PathBuf>) {
            *self.picked_folder.lock().unwrap() = path;
        }

        fn set_pick_files(&self, paths: Option<Vec<PathBuf>>) {
            *self.picked_files.lock().unwrap() = paths;
        }
    }

    impl DialogService for MockDialogService {
        fn pick_directory(&self, _start: Option<&Path>) -> Option<PathBuf> {
            self.picked_folder.lock().unwrap().clone()
        }
        fn pick_files(&self, filters: &[DialogFilter]) -> Option<Vec<PathBuf>> {
            *self.seen_filters.lock().unwrap() = filters.to_vec();
            self.picked_files.lock().unwrap().clone()
        }
        fn pick_folders(&self) -> Option<Vec<PathBuf>> {
            *self.folders_requested.lock().unwrap() = true;
            self.picked_files.lock().unwrap().clone()
        }
    }

    struct TestHarness {
        state: Arc<Mutex<AppState>>,
        proxy: TestEventProxy,
        event_rx: mpsc::UnboundedReceiver<UserEvent>,
        dialog: MockDialogService,
        temp_dir: TempDir,
        storage: PathBuf,
    }

    impl TestHarness {
        fn new() -> Self {
            let temp_dir = tempdir().expect("Failed to create temp dir");
            let storage = temp_dir.path().join("vault");
            let (tx, rx) = mpsc::unbounded_channel();

            let mut state = AppState::new(AppConfig {
                storage_path: Some(storage.clone()),
                search_debounce_ms: 20,
                delete_retry_delay_ms: 1,
                ..Default::default()
            });
            state.config_dir = Some(temp_dir.path().join("settings"));

            Self {
                state: Arc::new(Mutex::new(state)),
                proxy: TestEventProxy { sender: tx },
                event_rx: rx,
                dialog: MockDialogService::default(),
                temp_dir,
                storage,
            }
        }

        /// Creates a file outside the storage root, ready to be imported.
        fn source_file(&self, name: &str, content: &str) -> PathBuf {
            let path = self.temp_dir.path().join("incoming").join(name);
            std_fs::create_dir_all(path.parent().unwrap()).unwrap();
            std_fs::write(&path, content).unwrap();
            path
        }

        async fn import(&self, names: &[&str]) {
            let paths = names
                .iter()
                .map(|name| self.source_file(name, "content"))
                .collect::<Vec<_>>();
            import_dropped(json!({ "paths": paths }), self.proxy.clone(), self.state.clone()).await;
        }

        fn drain(&mut self) -> Vec<UserEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.event_rx.try_recv() {
                events.push(event);
            }
            events
        }

        fn last_state_update(&mut self) -> Option<Box<UiState>> {
            self.drain().into_iter().rev().find_map(|event| match event {
                UserEvent::StateUpdate(ui) => Some(ui),
                _ => None,
            })
        }

        fn errors(&mut self) -> Vec<String> {
            self.drain()
                .into_iter()
                .filter_map(|event| match event {
                    UserEvent::ShowError(message) => Some(message),
                    _ => None,
                })
                .collect()
        }

        fn card_names(ui: &UiState) -> Vec<String> {
            ui.cards.iter().map(|card| card.name.clone()).collect()
        }
    }

    #[tokio::test]
    async fn test_select_storage_path_persists_and_scans() {
        let mut harness = TestHarness::new();
        let new_root = harness.temp_dir.path().join("other-vault");
        harness.dialog.set_pick_folder(Some(new_root.clone()));

        select_storage_path(&harness.dialog, harness.proxy.clone(), harness.state.clone()).await;

        assert_eq!(
            lock_state(&harness.state).config.storage_path.as_deref(),
            Some(new_root.as_path())
        );
        assert!(new_root.join("images").is_dir());
        assert!(new_root.join("models").is_dir());
        let saved = std_fs::read_to_string(harness.temp_dir.path().join("settings/config.json"))
            .unwrap();
        assert!(saved.contains("other-vault"));

        let ui = harness.last_state_update().expect("state update");
        assert_eq!(ui.storage_path.as_deref(), Some(new_root.as_path()));
        assert!(ui.cards.is_empty());
    }

    #[tokio::test]
    async fn test_select_storage_path_cancelled_changes_nothing() {
        let mut harness = TestHarness::new();
        harness.dialog.set_pick_folder(None);

        select_storage_path(&harness.dialog, harness.proxy.clone(), harness.state.clone()).await;

        assert_eq!(
            lock_state(&harness.state).config.storage_path.as_deref(),
            Some(harness.storage.as_path())
        );
        assert!(harness.drain().is_empty());
    }

    #[tokio::test]
    async fn test_import_dropped_skips_unsupported_items() {
        let mut harness = TestHarness::new();

        harness.import(&["a.png", "b.xyz"]).await;

        assert!(harness.storage.join("images/a.png").is_file());
        let ui = harness.last_state_update().unwrap();
        assert_eq!(TestHarness::card_names(&ui), vec!["a.png"]);
        assert_eq!(ui.status_message, "Imported 1 of 2 item(s).");
        assert!(!ui.is_importing);
    }

    #[tokio::test]
    async fn test_import_without_storage_reports_error() {
        let mut harness = TestHarness::new();
        lock_state(&harness.state).config.storage_path = None;

        harness.import(&["a.png"]).await;

        let errors = harness.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("storage"));
    }

    #[tokio::test]
    async fn test_concurrent_import_is_rejected() {
        let mut harness = TestHarness::new();
        lock_state(&harness.state).is_importing = true;

        harness.import(&["a.png"]).await;

        assert!(!harness.storage.join("images/a.png").exists());
        assert!(harness.errors()[0].contains("another import"));
    }

    #[tokio::test]
    async fn test_import_dialog_uses_category_filters() {
        let mut harness = TestHarness::new();
        let source = harness.source_file("clip.mp4", "video");
        harness.dialog.set_pick_files(Some(vec![source]));

        import_dialog(
            json!({ "category": "videos" }),
            &harness.dialog,
            harness.proxy.clone(),
            harness.state.clone(),
        )
        .await;

        let filters = harness.dialog.seen_filters.lock().unwrap().clone();
        assert_eq!(filters, dialog_filters(Some(Category::Videos)));
        assert!(harness.storage.join("videos/clip.mp4").is_file());
        let ui = harness.last_state_update().unwrap();
        assert_eq!(TestHarness::card_names(&ui), vec!["clip.mp4"]);
    }

    #[tokio::test]
    async fn test_import_dialog_for_folders_picks_directories() {
        let mut harness = TestHarness::new();
        let folder = harness.temp_dir.path().join("incoming/sketches");
        std_fs::create_dir_all(&folder).unwrap();
        std_fs::write(folder.join("notes.md"), "x").unwrap();
        harness.dialog.set_pick_files(Some(vec![folder]));

        import_dialog(
            json!({ "category": "folders" }),
            &harness.dialog,
            harness.proxy.clone(),
            harness.state.clone(),
        )
        .await;

        assert!(*harness.dialog.folders_requested.lock().unwrap());
        assert!(harness.storage.join("folders/sketches/notes.md").is_file());
        let ui = harness.last_state_update().unwrap();
        assert_eq!(ui.cards[0].file_type, "folder");
    }

    #[tokio::test]
    async fn test_category_and_search_filters() {
        let mut harness = TestHarness::new();
        harness.import(&["sunset.png", "sunrise.jpg", "song.mp3"]).await;
        harness.drain();

        set_category(
            json!({ "category": "photos" }),
            harness.proxy.clone(),
            harness.state.clone(),
        );
        let ui = harness.last_state_update().unwrap();
        assert_eq!(ui.cards.len(), 2);
        let counts: Vec<usize> = ui.categories.iter().map(|c| c.count).collect();
        assert_eq!(counts[0], 3);

        update_search(
            json!({ "query": "SUNS" }),
            harness.proxy.clone(),
            harness.state.clone(),
        );
        let ui = loop {
            match harness.event_rx.recv().await {
                Some(UserEvent::StateUpdate(ui)) => break ui,
                Some(_) => continue,
                None => panic!("proxy closed"),
            }
        };
        assert_eq!(TestHarness::card_names(&ui), vec!["sunset.png"]);
        assert_eq!(ui.search_query, "SUNS");
    }

    #[tokio::test]
    async fn test_newer_search_replaces_pending_one() {
        let mut harness = TestHarness::new();
        lock_state(&harness.state).config.search_debounce_ms = 200;
        harness.import(&["alpha.png", "beta.png"]).await;
        harness.drain();

        update_search(json!({ "query": "alp" }), harness.proxy.clone(), harness.state.clone());
        update_search(json!({ "query": "bet" }), harness.proxy.clone(), harness.state.clone());

        let ui = loop {
            if let Some(UserEvent::StateUpdate(ui)) = harness.event_rx.recv().await {
                break ui;
            }
        };
        assert_eq!(ui.search_query, "bet");
        assert_eq!(TestHarness::card_names(&ui), vec!["beta.png"]);
    }

    #[tokio::test]
    async fn test_tag_lifecycle_through_commands() {
        let mut harness = TestHarness::new();
        harness.import(&["a.md", "b.md", "c.md"]).await;
        let notes = harness.storage.join("notes");

        add_tag(
            json!({ "category": "notes", "name": " draft " }),
            harness.proxy.clone(),
            harness.state.clone(),
        )
        .await;
        for name in ["a.md", "b.md"] {
            set_file_tags(
                json!({ "path": notes.join(name), "tags": ["draft"] }),
                harness.proxy.clone(),
                harness.state.clone(),
            )
            .await;
        }

        set_category(json!({ "category": "notes" }), harness.proxy.clone(), harness.state.clone());
        toggle_tag_filter(json!({ "tag": "draft" }), harness.proxy.clone(), harness.state.clone());
        let ui = harness.last_state_update().unwrap();
        assert_eq!(ui.vocabulary, vec!["draft"]);
        assert_eq!(TestHarness::card_names(&ui), vec!["a.md", "b.md"]);

        rename_tag(
            json!({ "category": "notes", "oldName": "draft", "newName": "final" }),
            harness.proxy.clone(),
            harness.state.clone(),
        )
        .await;
        let ui = harness.last_state_update().unwrap();
        assert_eq!(ui.vocabulary, vec!["final"]);
        assert_eq!(ui.selected_tags, vec!["final"]);
        assert_eq!(TestHarness::card_names(&ui), vec!["a.md", "b.md"]);
        assert_eq!(ui.cards[0].tags, vec!["final"]);

        let store = JsonTagStore::new(&harness.storage);
        assert_eq!(
            store.file_tags(Category::Notes, &notes.join("b.md")).await,
            vec!["final"]
        );

        delete_tag(
            json!({ "category": "notes", "name": "final" }),
            harness.proxy.clone(),
            harness.state.clone(),
        )
        .await;
        let ui = harness.last_state_update().unwrap();
        assert!(ui.vocabulary.is_empty());
        assert!(ui.selected_tags.is_empty());
        assert_eq!(ui.cards.len(), 3);
        assert!(store
            .file_tags(Category::Notes, &notes.join("a.md"))
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_tags_on_all_are_rejected() {
        let mut harness = TestHarness::new();

        add_tag(
            json!({ "category": "all", "name": "x" }),
            harness.proxy.clone(),
            harness.state.clone(),
        )
        .await;

        let errors = harness.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("single category"));
    }

    #[tokio::test]
    async fn test_rename_to_existing_tag_is_rejected() {
        let mut harness = TestHarness::new();
        for name in ["a", "b"] {
            add_tag(
                json!({ "category": "code", "name": name }),
                harness.proxy.clone(),
                harness.state.clone(),
            )
            .await;
        }
        harness.drain();

        rename_tag(
            json!({ "category": "code", "oldName": "a", "newName": "b" }),
            harness.proxy.clone(),
            harness.state.clone(),
        )
        .await;

        assert!(harness.errors()[0].contains("already exists"));
        let store = JsonTagStore::new(&harness.storage);
        assert_eq!(store.vocabulary(Category::Code).await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_delete_file_rescans() {
        let mut harness = TestHarness::new();
        harness.import(&["a.png", "b.png"]).await;
        let target = harness.storage.join("images/a.png");

        delete_file(json!({ "path": target }), harness.proxy.clone(), harness.state.clone()).await;

        assert!(!target.exists());
        let ui = harness.last_state_update().unwrap();
        assert_eq!(TestHarness::card_names(&ui), vec!["b.png"]);
    }

    #[tokio::test]
    async fn test_delete_outside_storage_is_refused() {
        let mut harness = TestHarness::new();
        let outside = harness.source_file("keep.txt", "precious");

        delete_file(json!({ "path": outside }), harness.proxy.clone(), harness.state.clone()).await;

        assert!(outside.exists());
        assert!(harness.errors()[0].contains("not inside the storage folder"));
    }

    #[tokio::test]
    async fn test_delete_with_parent_dir_components_is_refused() {
        let mut harness = TestHarness::new();
        std_fs::create_dir_all(harness.storage.join("notes")).unwrap();
        let outside = harness.temp_dir.path().join("precious.txt");
        std_fs::write(&outside, "keep me").unwrap();
        let sneaky = harness.storage.join("notes").join("..").join("..").join("precious.txt");

        delete_file(json!({ "path": sneaky }), harness.proxy.clone(), harness.state.clone()).await;

        assert!(outside.exists());
        assert!(harness.errors()[0].contains("not inside the storage folder"));
    }

    #[tokio::test]
    async fn test_delete_of_storage_root_itself_is_refused() {
        let mut harness = TestHarness::new();
        std_fs::create_dir_all(harness.storage.join("images")).unwrap();
        let root_alias = harness.storage.join("images").join("..");

        delete_file(json!({ "path": root_alias }), harness.proxy.clone(), harness.state.clone()).await;
        delete_file(
            json!({ "path": harness.storage.clone() }),
            harness.proxy.clone(),
            harness.state.clone(),
        )
        .await;

        assert!(harness.storage.join("images").is_dir());
        assert_eq!(harness.errors().len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_delete_through_symlinked_folder_is_refused() {
        let mut harness = TestHarness::new();
        std_fs::create_dir_all(&harness.storage).unwrap();
        let outside_dir = harness.temp_dir.path().join("elsewhere");
        std_fs::create_dir_all(&outside_dir).unwrap();
        std_fs::write(outside_dir.join("data.txt"), "keep").unwrap();
        std::os::unix::fs::symlink(&outside_dir, harness.storage.join("folders")).unwrap();

        delete_file(
            json!({ "path": harness.storage.join("folders/data.txt") }),
            harness.proxy.clone(),
            harness.state.clone(),
        )
        .await;

        assert!(outside_dir.join("data.txt").exists());
        assert!(harness.errors()[0].contains("not inside the storage folder"));
    }

    #[tokio::test]
    async fn test_preview_file() {
        let mut harness = TestHarness::new();
        let file = harness.source_file("readme.md", "hello preview");

        preview_file(json!({ "path": file }), harness.proxy.clone()).await;

        match harness.drain().pop() {
            Some(UserEvent::ShowFilePreview { content, full, .. }) => {
                assert_eq!(content, "hello preview");
                assert!(!full);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        preview_file(
            json!({ "path": harness.temp_dir.path().join("missing.md") }),
            harness.proxy.clone(),
        )
        .await;
        assert!(harness.errors()[0].starts_with("Cannot preview"));
    }

    #[tokio::test]
    async fn test_project_stats_event() {
        let mut harness = TestHarness::new();
        let project = harness.temp_dir.path().join("proj");
        std_fs::create_dir_all(project.join("src")).unwrap();
        std_fs::write(project.join("src/main.rs"), "fn main() {}\n").unwrap();

        project_stats(json!({ "path": project }), harness.proxy.clone()).await;

        match harness.drain().pop() {
            Some(UserEvent::ShowProjectStats { stats, .. }) => {
                assert_eq!(stats.file_count, 1);
                assert_eq!(stats.main_language, "Rust");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_initialize_without_storage_only_notifies() {
        let mut harness = TestHarness::new();
        lock_state(&harness.state).config.storage_path = None;

        initialize(harness.proxy.clone(), harness.state.clone()).await;

        let events = harness.drain();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], UserEvent::StateUpdate(ui) if ui.storage_path.is_none()));
    }
}
