//! Integration tests for Material Vault.
//!
//! The core scenarios run against a real temporary storage root. The app
//! scenarios drive IPC messages through `app::dispatch` and observe the
//! events sent back to the UI over a tokio MPSC channel.

use material_vault::app::{self, events::UserEvent, proxy::EventProxy, state::AppState};
use material_vault::config::AppConfig;
use material_vault::core::category::DialogFilter;
use material_vault::core::{
    compute_visible, import_paths, load_existing, Category, CategoryFilter, FileRecord, FileType,
    FilterQuery, ImportDestination, JsonTagStore, TagStore,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Contains the test infrastructure.
mod helpers {
    use super::*;
    use std::fs;

    /// A test double for the `EventLoopProxy` using a tokio MPSC channel.
    #[derive(Clone)]
    pub struct TestEventProxy {
        pub sender: mpsc::UnboundedSender<UserEvent>,
    }

    impl EventProxy for TestEventProxy {
        fn send_event(&self, event: UserEvent) {
            if let Err(e) = self.sender.send(event) {
                panic!("Test receiver dropped: {}", e);
            }
        }
    }

    /// Dialogs are never opened by these tests.
    pub struct NoDialog;

    impl app::file_dialog::DialogService for NoDialog {
        fn pick_directory(&self, _start: Option<&Path>) -> Option<PathBuf> {
            None
        }
        fn pick_files(&self, _filters: &[DialogFilter]) -> Option<Vec<PathBuf>> {
            None
        }
        fn pick_folders(&self) -> Option<Vec<PathBuf>> {
            None
        }
    }

    /// A storage root plus a scratch folder for import sources.
    pub struct TestHarness {
        pub state: Arc<Mutex<AppState>>,
        pub proxy: TestEventProxy,
        pub event_rx: mpsc::UnboundedReceiver<UserEvent>,
        pub storage: PathBuf,
        pub incoming: PathBuf,
        _temp_dir: TempDir,
    }

    impl TestHarness {
        pub fn new() -> Self {
            let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
            let storage = temp_dir.path().join("vault");
            let incoming = temp_dir.path().join("incoming");
            fs::create_dir_all(&incoming).unwrap();
            let (event_tx, event_rx) = mpsc::unbounded_channel();

            let mut state = AppState::new(AppConfig {
                storage_path: Some(storage.clone()),
                ..Default::default()
            });
            state.config_dir = Some(temp_dir.path().join("settings"));

            Self {
                state: Arc::new(Mutex::new(state)),
                proxy: TestEventProxy { sender: event_tx },
                event_rx,
                storage,
                incoming,
                _temp_dir: temp_dir,
            }
        }

        pub fn create_source(&self, relative_path: &str, content: &str) -> PathBuf {
            let path = self.incoming.join(relative_path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, content).unwrap();
            path
        }

        pub async fn send(&self, message: serde_json::Value) {
            let msg = serde_json::from_value(message).expect("valid IPC message");
            app::dispatch(msg, &NoDialog, self.proxy.clone(), self.state.clone()).await;
        }

        /// The newest `StateUpdate` queued so far.
        pub fn last_state_update(&mut self) -> Option<Box<app::view_model::UiState>> {
            let mut last = None;
            while let Ok(event) = self.event_rx.try_recv() {
                if let UserEvent::StateUpdate(ui) = event {
                    last = Some(ui);
                }
            }
            last
        }
    }
}

use helpers::TestHarness;
use serde_json::json;

fn names(records: &[FileRecord]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}

#[tokio::test]
async fn test_import_then_rescan_finds_every_item() {
    let harness = TestHarness::new();
    let sources = vec![
        harness.create_source("a.png", "png"),
        harness.create_source("b.MP4", "mp4"),
        harness.create_source("deck.pptx", "ppt"),
        harness.create_source("logo.icns", "icns"),
        harness.create_source("site/package.json", "{}"),
        harness.create_source("album/cover.txt", "x"),
    ];

    let imported = import_paths(&harness.storage, &sources, ImportDestination::Auto).await;
    assert_eq!(imported.len(), sources.len());

    let files = load_existing(&harness.storage).await.unwrap();
    let found: Vec<(String, String)> = files
        .iter()
        .map(|r| (r.name.clone(), r.file_type.to_string()))
        .collect();
    assert!(found.contains(&("a.png".into(), ".png".into())));
    assert!(found.contains(&("b.MP4".into(), ".mp4".into())));
    assert!(found.contains(&("deck.pptx".into(), ".pptx".into())));
    assert!(found.contains(&("logo.icns".into(), ".icns".into())));
    assert!(found.contains(&("site".into(), ".project".into())));
    assert!(found.contains(&("album".into(), "folder".into())));

    // The scan sees exactly what the import produced, in category-folder order.
    let categories: Vec<Option<Category>> = files.iter().map(FileRecord::category).collect();
    let mut sorted = categories.clone();
    sorted.sort();
    assert_eq!(categories, sorted);
}

#[tokio::test]
async fn test_png_search_scenario() {
    let harness = TestHarness::new();
    let sources = vec![
        harness.create_source("a.png", "1"),
        harness.create_source("b.mp4", "2"),
        harness.create_source("screenshot.jpg", "3"),
    ];
    import_paths(&harness.storage, &sources, ImportDestination::Auto).await;
    let files = load_existing(&harness.storage).await.unwrap();

    let mut query = FilterQuery::new(CategoryFilter::All);
    query.search_term = "png".to_string();
    let visible = compute_visible(&files, &query, |_, _| Vec::new());
    assert_eq!(names(&visible), vec!["a.png"]);

    query.category = CategoryFilter::Only(Category::Photos);
    query.search_term.clear();
    let visible = compute_visible(&files, &query, |_, _| Vec::new());
    assert_eq!(names(&visible), vec!["a.png", "screenshot.jpg"]);
}

#[tokio::test]
async fn test_tags_survive_moving_the_storage_root() {
    let harness = TestHarness::new();
    let source = harness.create_source("clip.mp4", "v");
    import_paths(&harness.storage, &[source], ImportDestination::Auto).await;

    let store = JsonTagStore::new(&harness.storage);
    let tags = vec!["b-roll".to_string()];
    store
        .set_file_tags(Category::Videos, &harness.storage.join("videos/clip.mp4"), &tags)
        .await
        .unwrap();

    let moved = harness.storage.with_file_name("moved-vault");
    std::fs::rename(&harness.storage, &moved).unwrap();

    let moved_store = JsonTagStore::new(&moved);
    assert_eq!(
        moved_store
            .file_tags(Category::Videos, &moved.join("videos/clip.mp4"))
            .await,
        tags
    );
}

#[tokio::test]
async fn test_ipc_tag_flow_filters_cards() {
    let mut harness = TestHarness::new();
    let sources = vec![
        harness.create_source("one.md", "1"),
        harness.create_source("two.md", "2"),
        harness.create_source("three.md", "3"),
        harness.create_source("four.md", "4"),
        harness.create_source("five.md", "5"),
    ];
    harness
        .send(json!({ "command": "importDropped", "payload": { "paths": sources } }))
        .await;
    harness
        .send(json!({ "command": "addTag", "payload": { "category": "notes", "name": "draft" } }))
        .await;
    for name in ["one.md", "three.md", "five.md"] {
        let path = harness.storage.join("notes").join(name);
        harness
            .send(json!({ "command": "setFileTags", "payload": { "path": path, "tags": ["draft"] } }))
            .await;
    }
    harness
        .send(json!({
            "command": "renameTag",
            "payload": { "category": "notes", "oldName": "draft", "newName": "final" }
        }))
        .await;
    harness
        .send(json!({ "command": "setCategory", "payload": { "category": "notes" } }))
        .await;
    harness
        .send(json!({ "command": "toggleTagFilter", "payload": { "tag": "final" } }))
        .await;

    let ui = harness.last_state_update().expect("state update");
    let mut shown: Vec<&str> = ui.cards.iter().map(|c| c.name.as_str()).collect();
    shown.sort();
    assert_eq!(shown, vec!["five.md", "one.md", "three.md"]);
    assert!(ui.cards.iter().all(|c| c.tags == vec!["final"]));
    assert_eq!(ui.vocabulary, vec!["final"]);
    assert_eq!(ui.categories[0].count, 5);
}

#[tokio::test]
async fn test_ipc_delete_removes_card() {
    let mut harness = TestHarness::new();
    let source = harness.create_source("song.mp3", "audio");
    harness
        .send(json!({ "command": "importDropped", "payload": { "paths": [source] } }))
        .await;
    let target = harness.storage.join("audio/song.mp3");
    assert!(target.is_file());

    harness
        .send(json!({ "command": "deleteFile", "payload": { "path": target } }))
        .await;

    assert!(!target.exists());
    let ui = harness.last_state_update().expect("state update");
    assert!(ui.cards.is_empty());
}

#[test]
fn test_every_marker_round_trips_through_file_type() {
    for category in Category::ALL {
        for ext in category.extensions() {
            let file_type = FileType::from_path(Path::new(&format!("x.{ext}")));
            assert_eq!(file_type.category(), Some(category), "extension {ext}");
        }
    }
}
