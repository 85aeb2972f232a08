use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use super::AppConfig;
use crate::utils::atomic_write::write_json_atomic;

const APP_NAME: &str = "MaterialVault";
const CONFIG_FILE: &str = "config.json";

/// Returns the platform-specific configuration directory for the application.
pub fn get_config_directory() -> Option<PathBuf> {
    ProjectDirs::from("io", "devsam", APP_NAME)
        .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
}

fn resolve_config_directory(override_dir: Option<&Path>) -> Result<PathBuf> {
    match override_dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => get_config_directory().context("Could not determine config directory"),
    }
}

/// Returns the full path to the configuration file.
pub fn get_config_file_path(override_dir: Option<&Path>) -> Result<PathBuf> {
    Ok(resolve_config_directory(override_dir)?.join(CONFIG_FILE))
}

/// Loads the configuration from `config.json` in `override_dir`, or in the
/// platform config directory when `None`.
///
/// A missing file is created with defaults. A file that cannot be parsed is
/// logged and replaced by defaults in memory; it is left on disk untouched.
pub fn load_config(override_dir: Option<&Path>) -> Result<AppConfig> {
    let config_path = get_config_file_path(override_dir)?;

    if !config_path.exists() {
        tracing::info!(
            "Config file not found, creating default config at {:?}",
            config_path
        );
        let default_config = AppConfig::default();
        save_config(&default_config, override_dir)?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;

    match serde_json::from_str::<AppConfig>(&config_content) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse config file at {:?}: {}. Falling back to default config.",
                config_path,
                e
            );
            Ok(AppConfig::default())
        }
    }
}

/// Saves the configuration atomically.
pub fn save_config(config: &AppConfig, override_dir: Option<&Path>) -> Result<()> {
    let config_path = get_config_file_path(override_dir)?;
    write_json_atomic(&config_path, config)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    tracing::info!("Saved config to {:?}", config_path);
    Ok(())
}
