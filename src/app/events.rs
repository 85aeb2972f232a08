//! Defines the event and message structures for communication between the backend and frontend.

use serde::Deserialize;
use std::path::PathBuf;

use super::view_model::UiState;
use crate::core::ProjectStats;

/// Events sent from the Rust backend to the WebView (UI thread).
///
/// Each variant corresponds to a specific JavaScript function (`window.*`) that will be called in the frontend.
#[derive(Debug)]
pub enum UserEvent {
    /// A complete state update to re-render the UI.
    StateUpdate(Box<UiState>),
    /// Text content for the preview panel of a card.
    ShowFilePreview {
        path: PathBuf,
        content: String,
        /// `true` when `content` is the whole file rather than its head.
        full: bool,
    },
    /// Source statistics of a code project.
    ShowProjectStats { path: PathBuf, stats: ProjectStats },
    /// An error message to be displayed to the user.
    ShowError(String),
    /// Indicates that files are being dragged over the window.
    DragStateChanged(bool),
}

/// A message received from the WebView via the IPC channel.
#[derive(Deserialize, Debug)]
pub struct IpcMessage {
    /// The name of the command to execute.
    pub command: String,
    /// The payload associated with the command, as a JSON value.
    #[serde(default)]
    pub payload: serde_json::Value,
}
