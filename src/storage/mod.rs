//! Persistent storage
//!
//! - [`handles`]: the SQLite handle store holding directory capabilities
//! - [`settings`]: the `sled` settings store for display state, history and
//!   backups
//!
//! Both live in the application data directory unless overridden with
//! `CHATVAULT_DATA_DIR`.

use crate::error::{ChatvaultError, Result};
use anyhow::Context;
use directories::ProjectDirs;
use std::path::PathBuf;

pub mod handles;
pub mod settings;
pub mod types;

pub use handles::{HandleStore, SqliteHandleStore, VAULT_KEY};
pub use settings::SettingsStore;
pub use types::{BackupEntry, HistoryEntry};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "CHATVAULT_DATA_DIR";

/// Resolve (and create) the data directory
///
/// # Errors
///
/// Returns `ChatvaultError::Storage` if no data directory can be determined
/// or it cannot be created.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var(DATA_DIR_ENV) {
        Ok(override_path) if !override_path.is_empty() => PathBuf::from(override_path),
        _ => ProjectDirs::from("com", "chatvault", "chatvault")
            .ok_or_else(|| ChatvaultError::Storage("Could not determine data directory".into()))?
            .data_dir()
            .to_path_buf(),
    };

    std::fs::create_dir_all(&dir)
        .context("Failed to create data directory")
        .map_err(|e| ChatvaultError::Storage(e.to_string()))?;

    Ok(dir)
}

/// Open the handle store in the data directory
pub fn open_handle_store() -> Result<SqliteHandleStore> {
    SqliteHandleStore::new(data_dir()?.join("handles.db"))
}

/// Open the settings store in the data directory
pub fn open_settings_store() -> Result<SettingsStore> {
    SettingsStore::new(data_dir()?.join("settings.sled"))
}
