//! Durable store for directory handles
//!
//! Handles are kept in a small SQLite database rather than the plain settings
//! store because a capability record is structured data keyed by a logical
//! name. The schema is versioned through `PRAGMA user_version` and created
//! lazily on open.

use crate::error::{ChatvaultError, Result};
use crate::platform::HandleRecord;
use anyhow::Context;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;

/// Logical key under which the chosen notes folder is stored
pub const VAULT_KEY: &str = "vault";

/// Current schema version of the handle database
const SCHEMA_VERSION: i64 = 1;

/// Key to opaque-handle mapping
pub trait HandleStore: Send + Sync {
    /// Insert or replace the handle stored under `key`
    fn put(&self, key: &str, handle: &HandleRecord) -> Result<()>;

    /// Fetch the handle stored under `key`
    fn get(&self, key: &str) -> Result<Option<HandleRecord>>;

    /// Remove the handle stored under `key`; missing keys are not an error
    fn delete(&self, key: &str) -> Result<()>;
}

/// SQLite-backed handle store
pub struct SqliteHandleStore {
    db_path: PathBuf,
}

impl SqliteHandleStore {
    /// Open (and if needed create) the handle database at `db_path`
    ///
    /// # Errors
    ///
    /// Returns `ChatvaultError::Storage` if the database cannot be opened or
    /// was written by a newer schema version.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatvault::storage::{HandleStore, SqliteHandleStore, VAULT_KEY};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SqliteHandleStore::new(dir.path().join("handles.db")).unwrap();
    /// assert!(store.get(VAULT_KEY).unwrap().is_none());
    /// ```
    pub fn new<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| ChatvaultError::Storage(e.to_string()))?;
        }

        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| ChatvaultError::Storage(e.to_string()).into())
    }

    /// Create or upgrade the schema
    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .context("Failed to read schema version")
            .map_err(|e| ChatvaultError::Storage(e.to_string()))?;

        if version > SCHEMA_VERSION {
            return Err(ChatvaultError::Storage(format!(
                "Handle database schema version {} is newer than supported version {}",
                version, SCHEMA_VERSION
            ))
            .into());
        }

        conn.execute(
            "CREATE TABLE IF NOT EXISTS directory_handles (
                key TEXT PRIMARY KEY,
                handle BLOB NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| ChatvaultError::Storage(e.to_string()))?;

        if version < SCHEMA_VERSION {
            conn.execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
                .context("Failed to record schema version")
                .map_err(|e| ChatvaultError::Storage(e.to_string()))?;
        }

        Ok(())
    }
}

impl HandleStore for SqliteHandleStore {
    fn put(&self, key: &str, handle: &HandleRecord) -> Result<()> {
        let conn = self.open()?;
        let blob = serde_json::to_vec(handle)
            .context("Failed to serialize handle")
            .map_err(|e| ChatvaultError::Storage(e.to_string()))?;

        conn.execute(
            "INSERT INTO directory_handles (key, handle, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET handle = excluded.handle, updated_at = excluded.updated_at",
            params![key, blob, Utc::now().to_rfc3339()],
        )
        .context("Failed to store handle")
        .map_err(|e| ChatvaultError::Storage(e.to_string()))?;

        tracing::debug!("Stored handle under key {}", key);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<HandleRecord>> {
        let conn = self.open()?;
        let blob: Option<Vec<u8>> = conn
            .query_row(
                "SELECT handle FROM directory_handles WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query handle")
            .map_err(|e| ChatvaultError::Storage(e.to_string()))?;

        match blob {
            Some(bytes) => {
                let record = serde_json::from_slice(&bytes)
                    .context("Failed to deserialize handle")
                    .map_err(|e| ChatvaultError::Storage(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute("DELETE FROM directory_handles WHERE key = ?", params![key])
            .context("Failed to delete handle")
            .map_err(|e| ChatvaultError::Storage(e.to_string()))?;

        tracing::debug!("Deleted handle under key {}", key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Helper: create a temporary store backed by a temp directory.
    fn create_test_store() -> (SqliteHandleStore, tempfile::TempDir) {
        let dir = tempdir().expect("failed to create tempdir");
        let store =
            SqliteHandleStore::new(dir.path().join("handles.db")).expect("failed to create store");
        (store, dir)
    }

    fn record(path: &str) -> HandleRecord {
        HandleRecord {
            name: "Vault".to_string(),
            payload: serde_json::json!({ "path": path }),
        }
    }

    #[test]
    fn test_init_creates_table_and_version() {
        let (store, _dir) = create_test_store();
        let conn = Connection::open(&store.db_path).expect("open connection");
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='directory_handles'",
                [],
                |r| r.get(0),
            )
            .expect("query row");
        assert_eq!(count, 1);

        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |r| r.get(0))
            .expect("version");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let (store, _dir) = create_test_store();
        store.put(VAULT_KEY, &record("/notes")).expect("put");
        let reopened = SqliteHandleStore::new(store.db_path.clone()).expect("reopen");
        assert_eq!(
            reopened.get(VAULT_KEY).expect("get"),
            Some(record("/notes"))
        );
    }

    #[test]
    fn test_put_replaces_existing() {
        let (store, _dir) = create_test_store();
        store.put(VAULT_KEY, &record("/old")).expect("put old");
        store.put(VAULT_KEY, &record("/new")).expect("put new");
        assert_eq!(store.get(VAULT_KEY).expect("get"), Some(record("/new")));
    }

    #[test]
    fn test_get_missing_returns_none() {
        let (store, _dir) = create_test_store();
        assert!(store.get("nothing").expect("get").is_none());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (store, _dir) = create_test_store();
        store.put(VAULT_KEY, &record("/notes")).expect("put");
        store.delete(VAULT_KEY).expect("first delete");
        store.delete(VAULT_KEY).expect("second delete");
        assert!(store.get(VAULT_KEY).expect("get").is_none());
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let db_path = dir.path().join("handles.db");
        let conn = Connection::open(&db_path).expect("open");
        conn.execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION + 1))
            .expect("set version");
        drop(conn);

        let err = SqliteHandleStore::new(db_path).err().expect("should fail");
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_open_failure_propagates() {
        let dir = tempdir().expect("tempdir");
        // A directory where the database file should be cannot be opened.
        let db_path = dir.path().join("handles.db");
        std::fs::create_dir(&db_path).expect("create dir");
        assert!(SqliteHandleStore::new(db_path).is_err());
    }
}
