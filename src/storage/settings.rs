//! Plain key-value settings storage
//!
//! Holds the display-only state around a save: the cached name of the chosen
//! folder, the history of saved conversations and the backups of notes that
//! could not be written. Never stores a directory handle itself.

use super::types::{BackupEntry, HistoryEntry};
use crate::error::{ChatvaultError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use std::path::Path;

/// Maximum number of history entries kept
pub const HISTORY_LIMIT: usize = 50;

/// Maximum number of backups kept
pub const BACKUP_LIMIT: usize = 10;

const FOLDER_NAME_KEY: &str = "vault_folder_name";
const HISTORY_KEY: &str = "history";
const BACKUPS_KEY: &str = "saved_files";

/// Settings store backed by an embedded `sled` database
pub struct SettingsStore {
    db: Db,
}

impl SettingsStore {
    /// Open or create a settings store
    ///
    /// # Errors
    ///
    /// Returns `ChatvaultError::Storage` if the database cannot be opened
    ///
    /// # Examples
    ///
    /// ```
    /// use chatvault::storage::SettingsStore;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let settings = SettingsStore::new(dir.path().join("settings.sled")).unwrap();
    /// assert!(settings.history().unwrap().is_empty());
    /// ```
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)
            .map_err(|e| ChatvaultError::Storage(format!("Failed to open database: {}", e)))?;
        Ok(Self { db })
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self
            .db
            .get(key.as_bytes())
            .map_err(|e| ChatvaultError::Storage(format!("Get failed: {}", e)))?
        {
            Some(bytes) => {
                let value =
                    serde_json::from_slice(&bytes).map_err(ChatvaultError::Serialization)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value).map_err(ChatvaultError::Serialization)?;

        self.db
            .insert(key.as_bytes(), bytes)
            .map_err(|e| ChatvaultError::Storage(format!("Insert failed: {}", e)))?;

        self.db
            .flush()
            .map_err(|e| ChatvaultError::Storage(format!("Flush failed: {}", e)))?;

        Ok(())
    }

    /// Cached display name of the chosen folder
    pub fn folder_name(&self) -> Result<Option<String>> {
        self.read(FOLDER_NAME_KEY)
    }

    /// Remember the display name of the chosen folder
    pub fn set_folder_name(&self, name: &str) -> Result<()> {
        self.write(FOLDER_NAME_KEY, &name)
    }

    /// Forget the cached folder name
    pub fn clear_folder_name(&self) -> Result<()> {
        self.db
            .remove(FOLDER_NAME_KEY.as_bytes())
            .map_err(|e| ChatvaultError::Storage(format!("Remove failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| ChatvaultError::Storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }

    /// Saved conversations, newest first
    pub fn history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.read(HISTORY_KEY)?.unwrap_or_default())
    }

    /// Record a saved conversation, keeping at most [`HISTORY_LIMIT`] entries
    pub fn append_history(&self, entry: HistoryEntry) -> Result<()> {
        let mut history = self.history()?;
        history.insert(0, entry);
        history.truncate(HISTORY_LIMIT);
        self.write(HISTORY_KEY, &history)
    }

    /// Stored backups, oldest first
    pub fn backups(&self) -> Result<Vec<BackupEntry>> {
        Ok(self.read(BACKUPS_KEY)?.unwrap_or_default())
    }

    /// Keep a note that could not be written, evicting the oldest backups
    /// beyond [`BACKUP_LIMIT`]
    ///
    /// A backup with the same file name replaces the earlier one.
    pub fn backup_file(&self, entry: BackupEntry) -> Result<()> {
        let mut backups = self.backups()?;
        backups.retain(|b| b.filename != entry.filename);
        backups.push(entry);
        backups.sort_by_key(|b| b.saved_at);
        if backups.len() > BACKUP_LIMIT {
            let excess = backups.len() - BACKUP_LIMIT;
            backups.drain(..excess);
        }
        self.write(BACKUPS_KEY, &backups)
    }
}
