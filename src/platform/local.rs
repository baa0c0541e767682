//! Local filesystem platform
//!
//! Directories on the local filesystem exposed as [`DirectoryCapability`].
//! Write grants live in memory for the lifetime of the process and are shared
//! by every capability the platform hands out, so a fresh invocation always
//! starts in [`PermissionState::Prompt`] and has to ask again. Picking a
//! folder counts as consent for that folder.

use super::{
    AccessError, AccessResult, DirectoryCapability, FileAccessPlatform, FileWriter, HandleRecord,
    PermissionMode, PermissionState, Prompter,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;

/// Write grants shared between a platform and its capabilities
type Grants = Arc<Mutex<HashSet<PathBuf>>>;

/// Platform backed by the local filesystem
pub struct LocalPlatform {
    prompter: Arc<dyn Prompter>,
    grants: Grants,
}

impl LocalPlatform {
    /// Create a platform asking `prompter` for consent
    pub fn new(prompter: Arc<dyn Prompter>) -> Self {
        Self {
            prompter,
            grants: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn directory(&self, path: PathBuf) -> LocalDirectory {
        LocalDirectory::new(path, Arc::clone(&self.prompter), Arc::clone(&self.grants))
    }
}

#[async_trait]
impl FileAccessPlatform for LocalPlatform {
    fn supports_directory_access(&self) -> bool {
        true
    }

    async fn pick_directory(&self) -> AccessResult<Arc<dyn DirectoryCapability>> {
        let chosen = self
            .prompter
            .choose_directory()
            .map_err(|e| AccessError::other(e.to_string()))?
            .ok_or_else(|| AccessError::aborted("folder selection cancelled"))?;

        let path = if chosen.is_absolute() {
            chosen
        } else {
            std::env::current_dir()
                .map_err(|e| AccessError::from_io(&e))?
                .join(chosen)
        };

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| AccessError::from_io(&e))?;
        if !metadata.is_dir() {
            return Err(AccessError::not_found(format!(
                "{} is not a directory",
                path.display()
            )));
        }

        let directory = self.directory(path);
        directory.grant();
        tracing::debug!("Picked folder {}", directory.path.display());
        Ok(Arc::new(directory))
    }

    fn restore(&self, record: &HandleRecord) -> AccessResult<Arc<dyn DirectoryCapability>> {
        let path = record
            .payload
            .get("path")
            .and_then(|p| p.as_str())
            .ok_or_else(|| AccessError::other("stored folder record has no path"))?;
        Ok(Arc::new(self.directory(PathBuf::from(path))))
    }
}

/// A directory on the local filesystem
pub struct LocalDirectory {
    path: PathBuf,
    name: String,
    prompter: Arc<dyn Prompter>,
    grants: Grants,
}

impl LocalDirectory {
    fn new(path: PathBuf, prompter: Arc<dyn Prompter>, grants: Grants) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            name,
            prompter,
            grants,
        }
    }

    /// Filesystem path of this directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_granted(&self) -> bool {
        self.grants
            .lock()
            .map(|grants| grants.iter().any(|g| self.path.starts_with(g)))
            .unwrap_or(false)
    }

    fn grant(&self) {
        if let Ok(mut grants) = self.grants.lock() {
            grants.insert(self.path.clone());
        }
    }

    async fn ensure_directory(&self) -> AccessResult<std::fs::Metadata> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| AccessError::from_io(&e))?;
        if !metadata.is_dir() {
            return Err(AccessError::not_found(format!(
                "{} is no longer a directory",
                self.path.display()
            )));
        }
        Ok(metadata)
    }

    fn child_path(&self, name: &str) -> AccessResult<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains('/')
            && !name.contains('\\');
        if !valid {
            return Err(AccessError::other(format!("invalid entry name: {:?}", name)));
        }
        Ok(self.path.join(name))
    }
}

#[async_trait]
impl DirectoryCapability for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn record(&self) -> HandleRecord {
        HandleRecord {
            name: self.name.clone(),
            payload: serde_json::json!({ "path": self.path.to_string_lossy() }),
        }
    }

    async fn query_permission(&self, mode: PermissionMode) -> AccessResult<PermissionState> {
        let metadata = self.ensure_directory().await?;
        let state = match mode {
            PermissionMode::Read => PermissionState::Granted,
            PermissionMode::ReadWrite if metadata.permissions().readonly() => {
                PermissionState::Denied
            }
            PermissionMode::ReadWrite if self.is_granted() => PermissionState::Granted,
            PermissionMode::ReadWrite => PermissionState::Prompt,
        };
        Ok(state)
    }

    async fn request_permission(&self, mode: PermissionMode) -> AccessResult<PermissionState> {
        let metadata = self.ensure_directory().await?;
        if mode == PermissionMode::Read {
            return Ok(PermissionState::Granted);
        }
        if metadata.permissions().readonly() {
            return Err(AccessError::not_allowed(format!(
                "{} is read-only",
                self.path.display()
            )));
        }
        if self.is_granted() {
            return Ok(PermissionState::Granted);
        }

        let question = format!("Allow chatvault to write to {}?", self.path.display());
        let approved = self
            .prompter
            .confirm(&question)
            .map_err(|e| AccessError::other(e.to_string()))?;
        if approved {
            self.grant();
            Ok(PermissionState::Granted)
        } else {
            Ok(PermissionState::Denied)
        }
    }

    async fn get_child_directory(
        &self,
        name: &str,
        create: bool,
    ) -> AccessResult<Arc<dyn DirectoryCapability>> {
        let path = self.child_path(name)?;
        if create {
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|e| AccessError::from_io(&e))?;
        }
        let child = LocalDirectory::new(path, Arc::clone(&self.prompter), Arc::clone(&self.grants));
        child.ensure_directory().await?;
        Ok(Arc::new(child))
    }

    async fn create_file(&self, name: &str) -> AccessResult<Box<dyn FileWriter>> {
        if !self.is_granted() {
            return Err(AccessError::not_allowed(format!(
                "write access to {} has not been granted",
                self.path.display()
            )));
        }
        let path = self.child_path(name)?;
        let file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| AccessError::from_io(&e))?;
        Ok(Box::new(LocalFileWriter { file }))
    }
}

struct LocalFileWriter {
    file: tokio::fs::File,
}

#[async_trait]
impl FileWriter for LocalFileWriter {
    async fn write_all(&mut self, bytes: &[u8]) -> AccessResult<()> {
        self.file
            .write_all(bytes)
            .await
            .map_err(|e| AccessError::from_io(&e))
    }

    async fn close(mut self: Box<Self>) -> AccessResult<()> {
        self.file
            .flush()
            .await
            .map_err(|e| AccessError::from_io(&e))?;
        self.file
            .sync_all()
            .await
            .map_err(|e| AccessError::from_io(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{AccessErrorKind, AutoApprovePrompter};
    use tempfile::tempdir;

    struct DenyingPrompter;

    impl Prompter for DenyingPrompter {
        fn confirm(&self, _question: &str) -> crate::error::Result<bool> {
            Ok(false)
        }

        fn choose_directory(&self) -> crate::error::Result<Option<PathBuf>> {
            Ok(None)
        }
    }

    fn approving(path: Option<PathBuf>) -> LocalPlatform {
        LocalPlatform::new(Arc::new(AutoApprovePrompter::new(path)))
    }

    #[tokio::test]
    async fn test_pick_directory_grants_write() {
        let dir = tempdir().unwrap();
        let platform = approving(Some(dir.path().to_path_buf()));
        let handle = platform.pick_directory().await.unwrap();
        let state = handle
            .query_permission(PermissionMode::ReadWrite)
            .await
            .unwrap();
        assert_eq!(state, PermissionState::Granted);
    }

    #[tokio::test]
    async fn test_pick_directory_cancelled_is_aborted() {
        let platform = LocalPlatform::new(Arc::new(DenyingPrompter));
        let err = platform.pick_directory().await.err().unwrap();
        assert_eq!(err.kind, AccessErrorKind::Aborted);
    }

    #[tokio::test]
    async fn test_pick_missing_directory_is_not_found() {
        let dir = tempdir().unwrap();
        let platform = approving(Some(dir.path().join("missing")));
        let err = platform.pick_directory().await.err().unwrap();
        assert_eq!(err.kind, AccessErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_restored_handle_starts_in_prompt() {
        let dir = tempdir().unwrap();
        let first = approving(Some(dir.path().to_path_buf()));
        let record = first.pick_directory().await.unwrap().record();

        let second = approving(None);
        let restored = second.restore(&record).unwrap();
        assert_eq!(
            restored
                .query_permission(PermissionMode::ReadWrite)
                .await
                .unwrap(),
            PermissionState::Prompt
        );
        assert_eq!(
            restored
                .request_permission(PermissionMode::ReadWrite)
                .await
                .unwrap(),
            PermissionState::Granted
        );
    }

    #[tokio::test]
    async fn test_request_denied_by_user() {
        let dir = tempdir().unwrap();
        let record = HandleRecord {
            name: "vault".to_string(),
            payload: serde_json::json!({ "path": dir.path().to_string_lossy() }),
        };
        let platform = LocalPlatform::new(Arc::new(DenyingPrompter));
        let handle = platform.restore(&record).unwrap();
        assert_eq!(
            handle
                .request_permission(PermissionMode::ReadWrite)
                .await
                .unwrap(),
            PermissionState::Denied
        );
    }

    #[tokio::test]
    async fn test_query_on_removed_directory_fails() {
        let dir = tempdir().unwrap();
        let vault = dir.path().join("vault");
        std::fs::create_dir(&vault).unwrap();
        let platform = approving(Some(vault.clone()));
        let handle = platform.pick_directory().await.unwrap();
        std::fs::remove_dir(&vault).unwrap();

        let err = handle
            .query_permission(PermissionMode::ReadWrite)
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind, AccessErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_restore_rejects_malformed_record() {
        let platform = approving(None);
        let record = HandleRecord {
            name: "vault".to_string(),
            payload: serde_json::json!({ "id": 7 }),
        };
        assert!(platform.restore(&record).is_err());
    }

    #[tokio::test]
    async fn test_child_directory_inherits_grant_and_writes() {
        let dir = tempdir().unwrap();
        let platform = approving(Some(dir.path().to_path_buf()));
        let root = platform.pick_directory().await.unwrap();
        let child = root.get_child_directory("Notes", true).await.unwrap();

        let mut file = child.create_file("note.md").await.unwrap();
        file.write_all(b"hello").await.unwrap();
        file.close().await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("Notes").join("note.md")).unwrap();
        assert_eq!(written, "hello");
    }

    #[tokio::test]
    async fn test_create_file_truncates_existing() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("note.md"), "old content that is long").unwrap();
        let platform = approving(Some(dir.path().to_path_buf()));
        let root = platform.pick_directory().await.unwrap();

        let mut file = root.create_file("note.md").await.unwrap();
        file.write_all(b"new").await.unwrap();
        file.close().await.unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("note.md")).unwrap(),
            "new"
        );
    }

    #[tokio::test]
    async fn test_create_file_without_grant_is_not_allowed() {
        let dir = tempdir().unwrap();
        let record = HandleRecord {
            name: "vault".to_string(),
            payload: serde_json::json!({ "path": dir.path().to_string_lossy() }),
        };
        let platform = approving(None);
        let handle = platform.restore(&record).unwrap();
        let err = handle.create_file("note.md").await.err().unwrap();
        assert_eq!(err.kind, AccessErrorKind::NotAllowed);
    }

    #[tokio::test]
    async fn test_child_name_with_separator_is_rejected() {
        let dir = tempdir().unwrap();
        let platform = approving(Some(dir.path().to_path_buf()));
        let root = platform.pick_directory().await.unwrap();
        let err = root.get_child_directory("../escape", true).await.err().unwrap();
        assert_eq!(err.kind, AccessErrorKind::Other);
    }
}
