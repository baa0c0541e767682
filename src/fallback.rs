//! Download-folder save path
//!
//! Used when the host has no directory access: the note goes into a fixed
//! `gpt2obs` folder under the user's downloads directory. When even that
//! write fails the note is kept as a backup in the settings store so it is
//! not lost.

use crate::document::Document;
use crate::error::{ChatvaultError, Result};
use crate::storage::{BackupEntry, SettingsStore};
use anyhow::Context;
use chrono::Utc;
use directories::UserDirs;
use std::path::{Path, PathBuf};

/// Folder created under the downloads directory
pub const DOWNLOAD_SUBFOLDER: &str = "gpt2obs";

/// Where a fallback save ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackOutcome {
    /// Written to the downloads folder
    Downloaded(PathBuf),
    /// Download failed; kept in the settings store
    BackedUp {
        /// Why the download failed
        reason: String,
    },
}

/// Resolve the downloads directory, preferring `override_dir`
///
/// # Errors
///
/// Returns `ChatvaultError::Config` when the platform reports no downloads
/// directory and none is configured
pub fn downloads_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
        .ok_or_else(|| {
            ChatvaultError::Config(
                "No downloads directory found; set downloads_dir in the config".to_string(),
            )
            .into()
        })
}

fn write_download(base: &Path, document: &Document) -> Result<PathBuf> {
    let dir = base.join(DOWNLOAD_SUBFOLDER);
    std::fs::create_dir_all(&dir)
        .map_err(ChatvaultError::Io)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(&document.filename);
    std::fs::write(&path, &document.content)
        .map_err(ChatvaultError::Io)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Save `document` into the downloads folder, backing it up on failure
///
/// # Errors
///
/// Returns an error only if the backup itself cannot be stored
pub fn save_to_downloads(
    document: &Document,
    downloads: Option<&Path>,
    settings: &SettingsStore,
) -> Result<FallbackOutcome> {
    let written = downloads_dir(downloads).and_then(|base| write_download(&base, document));

    match written {
        Ok(path) => {
            tracing::info!("Saved note to downloads: {}", path.display());
            Ok(FallbackOutcome::Downloaded(path))
        }
        Err(e) => {
            let reason = format!("{:#}", e);
            tracing::error!("Download save failed, keeping backup: {}", reason);
            settings.backup_file(BackupEntry {
                filename: document.filename.clone(),
                content: document.content.clone(),
                saved_at: Utc::now(),
            })?;
            Ok(FallbackOutcome::BackedUp { reason })
        }
    }
}
