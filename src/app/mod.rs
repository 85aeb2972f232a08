//! The desktop application layer: shared state, IPC command dispatch and the
//! events sent back to the WebView.

pub mod commands;
pub mod events;
pub mod file_dialog;
pub mod filtering;
pub mod helpers;
pub mod proxy;
pub mod state;
pub mod tasks;
pub mod view_model;

use std::sync::{Arc, Mutex};

use events::IpcMessage;
#[cfg(feature = "desktop")]
use events::UserEvent;
use file_dialog::DialogService;
use helpers::report_error;
use proxy::EventProxy;
use state::AppState;

/// Entry point for messages posted by the frontend (`window.ipc.postMessage`).
///
/// The message is parsed on the calling thread; the command itself runs on
/// the tokio runtime so the event loop never blocks on I/O.
pub fn handle_ipc_message<D, P>(
    message: String,
    dialog: Arc<D>,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) where
    D: DialogService + 'static,
    P: EventProxy,
{
    match serde_json::from_str::<IpcMessage>(&message) {
        Ok(msg) => {
            tokio::spawn(async move {
                dispatch(msg, dialog.as_ref(), proxy, state).await;
            });
        }
        Err(e) => report_error(&proxy, "Malformed IPC message", e),
    }
}

/// Runs a single IPC command to completion.
pub async fn dispatch<D, P>(msg: IpcMessage, dialog: &D, proxy: P, state: Arc<Mutex<AppState>>)
where
    D: DialogService + ?Sized,
    P: EventProxy,
{
    tracing::debug!("IPC command: {}", msg.command);
    let payload = msg.payload;
    match msg.command.as_str() {
        "initialize" => commands::initialize(proxy, state).await,
        "selectStoragePath" => commands::select_storage_path(dialog, proxy, state).await,
        "loadFiles" => commands::load_files(proxy, state).await,
        "setCategory" => commands::set_category(payload, proxy, state),
        "updateSearch" => commands::update_search(payload, proxy, state),
        "toggleTagFilter" => commands::toggle_tag_filter(payload, proxy, state),
        "addTag" => commands::add_tag(payload, proxy, state).await,
        "renameTag" => commands::rename_tag(payload, proxy, state).await,
        "deleteTag" => commands::delete_tag(payload, proxy, state).await,
        "setFileTags" => commands::set_file_tags(payload, proxy, state).await,
        "importDialog" => commands::import_dialog(payload, dialog, proxy, state).await,
        "importDropped" => commands::import_dropped(payload, proxy, state).await,
        "importUrl" => commands::import_url(payload, proxy, state).await,
        "importClipboard" => commands::import_clipboard(payload, proxy, state).await,
        "deleteFile" => commands::delete_file(payload, proxy, state).await,
        "openFile" => commands::open_file(payload, proxy),
        "revealFile" => commands::reveal_file(payload, proxy),
        "openStorageLocation" => commands::open_storage_location(proxy, state),
        "previewFile" => commands::preview_file(payload, proxy).await,
        "projectStats" => commands::project_stats(payload, proxy).await,
        other => tracing::warn!("Unknown IPC command: {}", other),
    }
}

/// Turns a backend event into a call of the matching `window.*` function.
#[cfg(feature = "desktop")]
pub fn handle_user_event(event: UserEvent, webview: &wry::WebView) {
    let script = match event {
        UserEvent::StateUpdate(ui_state) => {
            serde_json::to_string(&ui_state).map(|json| format!("window.render({json});"))
        }
        UserEvent::ShowFilePreview {
            path,
            content,
            full,
        } => serde_json::to_string(&serde_json::json!({
            "path": path,
            "content": content,
            "full": full,
        }))
        .map(|json| format!("window.showFilePreview({json});")),
        UserEvent::ShowProjectStats { path, stats } => serde_json::to_string(&serde_json::json!({
            "path": path,
            "stats": stats,
        }))
        .map(|json| format!("window.showProjectStats({json});")),
        UserEvent::ShowError(message) => {
            serde_json::to_string(&message).map(|json| format!("window.showError({json});"))
        }
        UserEvent::DragStateChanged(active) => Ok(format!("window.setDragState({active});")),
    };

    match script {
        Ok(script) => {
            if let Err(e) = webview.evaluate_script(&script) {
                tracing::error!("Failed to evaluate script: {}", e);
            }
        }
        Err(e) => tracing::error!("Failed to serialize event for the UI: {}", e),
    }
}
