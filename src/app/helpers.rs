//! Contains helper functions to reduce boilerplate code in other `app` modules.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::events::UserEvent;
use super::proxy::EventProxy;
use super::state::AppState;
use super::view_model::generate_ui_state;

/// Locks the state. A poisoned lock is recovered: the state is rebuilt
/// wholesale by the next reload anyway.
pub fn lock_state(state: &Arc<Mutex<AppState>>) -> MutexGuard<'_, AppState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sends the current view model to the UI.
pub fn notify<P: EventProxy>(state: &AppState, proxy: &P) {
    let ui_state = generate_ui_state(state);
    proxy.send_event(UserEvent::StateUpdate(Box::new(ui_state)));
}

/// A helper function that locks the `AppState`, performs a mutation,
/// and then automatically sends a `StateUpdate` event to the UI.
///
/// This significantly reduces boilerplate in the command handlers.
pub fn with_state_and_notify<F, P: EventProxy>(
    state: &Arc<Mutex<AppState>>,
    proxy: &P,
    update_fn: F,
) where
    F: FnOnce(&mut AppState),
{
    let mut state_guard = lock_state(state);
    update_fn(&mut state_guard);
    notify(&state_guard, proxy);
}

/// Reports a failure to the user and the log.
pub fn report_error<P: EventProxy>(proxy: &P, context: &str, error: impl std::fmt::Display) {
    tracing::error!("{}: {}", context, error);
    proxy.send_event(UserEvent::ShowError(format!("{context}: {error}")));
}

/// Opens `path` with the default application. `false` when it is gone.
pub fn open_path(path: &Path) -> bool {
    if !path.exists() {
        tracing::warn!("Cannot open {}: path does not exist", path.display());
        return false;
    }
    match open::that_detached(path) {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Failed to open {}: {}", path.display(), e);
            false
        }
    }
}

/// Shows `path` in the system file manager by opening its parent folder.
pub fn reveal_in_folder(path: &Path) -> bool {
    if !path.exists() {
        tracing::warn!("Cannot reveal {}: path does not exist", path.display());
        return false;
    }
    match path.parent() {
        Some(parent) => open_path(parent),
        None => open_path(path),
    }
}
