//! An abstraction layer for native file dialogs to enable testing.

use crate::core::category::DialogFilter;
use std::path::{Path, PathBuf};

/// Defines a common interface for file and folder selection dialogs.
/// This allows for a mock implementation during tests, avoiding the need
/// to interact with actual OS dialog windows.
pub trait DialogService: Send + Sync {
    /// Opens a dialog to select the storage directory.
    fn pick_directory(&self, start: Option<&Path>) -> Option<PathBuf>;

    /// Opens a dialog to select one or more files to import.
    fn pick_files(&self, filters: &[DialogFilter]) -> Option<Vec<PathBuf>>;

    /// Opens a dialog to select one or more folders to import.
    fn pick_folders(&self) -> Option<Vec<PathBuf>>;
}

/// The production implementation that uses the `rfd` crate to show native OS dialogs.
#[cfg(feature = "desktop")]
pub struct NativeDialogService;

#[cfg(feature = "desktop")]
impl DialogService for NativeDialogService {
    fn pick_directory(&self, start: Option<&Path>) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new().set_title("Choose the storage folder");
        if let Some(dir) = start.filter(|dir| dir.is_dir()) {
            dialog = dialog.set_directory(dir);
        }
        dialog.pick_folder()
    }

    fn pick_files(&self, filters: &[DialogFilter]) -> Option<Vec<PathBuf>> {
        let mut dialog = rfd::FileDialog::new().set_title("Choose files to import");
        for filter in filters {
            dialog = dialog.add_filter(filter.name, &filter.extensions);
        }
        dialog.pick_files()
    }

    fn pick_folders(&self) -> Option<Vec<PathBuf>> {
        rfd::FileDialog::new()
            .set_title("Choose folders to import")
            .pick_folders()
    }
}
