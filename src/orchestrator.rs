//! Save pipeline
//!
//! [`SaveOrchestrator::save`] walks a fixed sequence of steps:
//!
//! ```text
//! Start -> ResolveHandle -> (PickHandle) -> VerifyPermission -> EnsureSubfolder
//!       -> Summarize -> BuildDocument -> WriteFile -> Done
//! ```
//!
//! Any step may end the run in `Abort`. Every failure is classified into a
//! [`SaveError`] where it happens and reported to the caller as exactly one
//! [`SaveOutcome`]. The stored directory handle is re-read and re-verified on
//! every run; nothing is cached between runs.

use crate::config::Config;
use crate::conversation::Conversation;
use crate::document::{Document, DocumentBuilder};
use crate::permission::PermissionGate;
use crate::platform::{AccessErrorKind, AccessResult, DirectoryCapability, FileAccessPlatform};
use crate::storage::{HandleStore, SettingsStore, VAULT_KEY};
use crate::summarizer::Summarizer;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Steps of a save run, reported to a [`SaveObserver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Start,
    ResolveHandle,
    PickHandle,
    VerifyPermission,
    EnsureSubfolder,
    Summarize,
    BuildDocument,
    WriteFile,
    Done,
    Abort,
}

impl fmt::Display for SaveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SaveState::Start => "starting",
            SaveState::ResolveHandle => "looking up folder",
            SaveState::PickHandle => "choosing folder",
            SaveState::VerifyPermission => "checking permission",
            SaveState::EnsureSubfolder => "preparing subfolder",
            SaveState::Summarize => "summarizing",
            SaveState::BuildDocument => "building note",
            SaveState::WriteFile => "writing file",
            SaveState::Done => "done",
            SaveState::Abort => "aborted",
        };
        f.write_str(label)
    }
}

/// Receives state transitions of a save run
pub trait SaveObserver: Send + Sync {
    fn on_state_change(&self, state: SaveState);
}

impl<F> SaveObserver for F
where
    F: Fn(SaveState) + Send + Sync,
{
    fn on_state_change(&self, state: SaveState) {
        self(state)
    }
}

/// Observer that ignores every transition
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SaveObserver for NoopObserver {
    fn on_state_change(&self, _state: SaveState) {}
}

/// Classified reason a save run stopped
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    #[error("Folder selection cancelled")]
    UserCancelled,

    #[error("Write permission was not granted")]
    PermissionDenied,

    #[error("Stored folder is no longer accessible")]
    HandlePermanentlyInvalid,

    #[error("Directory access is not supported on this platform")]
    UnsupportedPlatform,

    #[error("API key is not configured")]
    MissingApiKey,

    #[error("Folder selection failed: {0}")]
    FolderSelection(String),

    #[error("Summary failed: {0}")]
    RemoteSummary(String),

    #[error("Failed to write note: {message}")]
    Write {
        message: String,
        /// The stored handle was evicted because of this failure
        evicted: bool,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Terminal result of a save run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Note written; `path` is the display path inside the chosen folder
    Saved { path: String },
    /// User dismissed the folder picker
    Cancelled,
    /// Permission was declined; a later attempt may succeed
    PermissionNeeded,
    /// The stored folder was discarded and must be chosen again
    ReselectFolder,
    /// The host has no directory access
    Unsupported,
    /// Anything else, with a user-facing message
    Failed { message: String },
}

impl SaveOutcome {
    /// True only for [`SaveOutcome::Saved`]
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }

    /// The one message shown to the user for this outcome
    pub fn notification(&self) -> String {
        match self {
            SaveOutcome::Saved { path } => format!("Saved to {}", path),
            SaveOutcome::Cancelled => "Folder selection cancelled".to_string(),
            SaveOutcome::PermissionNeeded => {
                "Write permission is needed for the chosen folder; save again and allow access"
                    .to_string()
            }
            SaveOutcome::ReselectFolder => {
                "The chosen folder is no longer accessible; please select it again".to_string()
            }
            SaveOutcome::Unsupported => {
                "This platform cannot save into a chosen folder".to_string()
            }
            SaveOutcome::Failed { message } => message.clone(),
        }
    }
}

impl From<SaveError> for SaveOutcome {
    fn from(error: SaveError) -> Self {
        match error {
            SaveError::UserCancelled => SaveOutcome::Cancelled,
            SaveError::PermissionDenied => SaveOutcome::PermissionNeeded,
            SaveError::HandlePermanentlyInvalid => SaveOutcome::ReselectFolder,
            SaveError::UnsupportedPlatform => SaveOutcome::Unsupported,
            SaveError::MissingApiKey => SaveOutcome::Failed {
                message: "Please set an API key first (chatvault config set --api-key)"
                    .to_string(),
            },
            SaveError::Write {
                message,
                evicted: true,
            } => SaveOutcome::Failed {
                message: format!(
                    "Failed to write note: {}. The folder is no longer accessible; please select it again",
                    message
                ),
            },
            other => SaveOutcome::Failed {
                message: other.to_string(),
            },
        }
    }
}

/// Summarize `conversation`, giving up after `deadline` when one is set
pub(crate) async fn summarize_with_deadline(
    summarizer: &dyn Summarizer,
    conversation: &Conversation,
    api_key: &str,
    deadline: Option<Duration>,
) -> std::result::Result<String, SaveError> {
    let call = summarizer.summarize(conversation, api_key);
    let result = match deadline {
        Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
            SaveError::RemoteSummary(format!(
                "summary request timed out after {}s",
                limit.as_secs_f32()
            ))
        })?,
        None => call.await,
    };
    result.map_err(|e| SaveError::RemoteSummary(e.upstream_message().to_string()))
}

/// Coordinates folder access, summarization and writing for one save
pub struct SaveOrchestrator {
    platform: Arc<dyn FileAccessPlatform>,
    handles: Arc<dyn HandleStore>,
    summarizer: Arc<dyn Summarizer>,
    settings: Option<Arc<SettingsStore>>,
    gate: PermissionGate,
    builder: DocumentBuilder,
    summary_timeout: Option<Duration>,
    observer: Arc<dyn SaveObserver>,
}

impl SaveOrchestrator {
    /// Create an orchestrator with local-time notes and no deadline
    pub fn new(
        platform: Arc<dyn FileAccessPlatform>,
        handles: Arc<dyn HandleStore>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            platform,
            handles,
            summarizer,
            settings: None,
            gate: PermissionGate::new(),
            builder: DocumentBuilder::local(),
            summary_timeout: None,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Mirror the chosen folder's name into `settings`
    pub fn with_settings(mut self, settings: Arc<SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Use `builder` to render notes
    pub fn with_document_builder(mut self, builder: DocumentBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Give up on the summary request after `timeout`
    pub fn with_summary_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.summary_timeout = timeout;
        self
    }

    /// Report state transitions to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn SaveObserver>) -> Self {
        self.observer = observer;
        self
    }

    fn enter(&self, state: SaveState) {
        tracing::debug!("Save state: {:?}", state);
        self.observer.on_state_change(state);
    }

    /// Summarize `conversation` and write it into the chosen folder
    pub async fn save(&self, conversation: &Conversation, config: &Config) -> SaveOutcome {
        self.enter(SaveState::Start);
        match self.run(conversation, config).await {
            Ok(path) => {
                self.enter(SaveState::Done);
                tracing::info!("Saved \"{}\" to {}", conversation.title, path);
                SaveOutcome::Saved { path }
            }
            Err(error) => {
                self.enter(SaveState::Abort);
                match &error {
                    SaveError::UserCancelled => tracing::info!("Save cancelled by user"),
                    SaveError::PermissionDenied => tracing::info!("Save stopped: {}", error),
                    _ => tracing::error!("Save failed: {}", error),
                }
                error.into()
            }
        }
    }

    /// Let the user choose a folder and store it, without saving anything
    ///
    /// Returns the display name of the chosen folder.
    pub async fn pick_folder(&self) -> std::result::Result<String, SaveError> {
        if !self.platform.supports_directory_access() {
            return Err(SaveError::UnsupportedPlatform);
        }
        let handle = self.pick_handle().await?;
        Ok(handle.name().to_string())
    }

    /// Drop the stored folder
    pub fn forget_folder(&self) -> std::result::Result<(), SaveError> {
        self.handles
            .delete(VAULT_KEY)
            .map_err(|e| SaveError::Storage(e.to_string()))?;
        self.clear_folder_name();
        Ok(())
    }

    async fn run(
        &self,
        conversation: &Conversation,
        config: &Config,
    ) -> std::result::Result<String, SaveError> {
        if !self.platform.supports_directory_access() {
            return Err(SaveError::UnsupportedPlatform);
        }
        if config.api_key.trim().is_empty() {
            return Err(SaveError::MissingApiKey);
        }

        self.enter(SaveState::ResolveHandle);
        let root = self.resolve_handle().await?;

        self.enter(SaveState::VerifyPermission);
        let permission = self.gate.ensure_writable(root.as_ref()).await;
        if permission.fatal {
            self.evict();
            return Err(SaveError::HandlePermanentlyInvalid);
        }
        if !permission.granted {
            return Err(SaveError::PermissionDenied);
        }

        self.enter(SaveState::EnsureSubfolder);
        let subfolder = config.subfolder.trim();
        let (target, display_dir) = match root.get_child_directory(subfolder, true).await {
            Ok(dir) => (dir, format!("{}/{}", root.name(), subfolder)),
            Err(e) => {
                tracing::warn!(
                    "Could not open subfolder {}: {}; writing to {} instead",
                    subfolder,
                    e,
                    root.name()
                );
                (Arc::clone(&root), root.name().to_string())
            }
        };

        self.enter(SaveState::Summarize);
        let summary = self.summarize(conversation, &config.api_key).await?;

        self.enter(SaveState::BuildDocument);
        let document = self.builder.build(conversation, &summary);

        self.enter(SaveState::WriteFile);
        if let Err(e) = write_document(target.as_ref(), &document).await {
            let evicted = e.is_terminal() && self.evict();
            return Err(SaveError::Write {
                message: e.message,
                evicted,
            });
        }

        Ok(format!("{}/{}", display_dir, document.filename))
    }

    async fn resolve_handle(
        &self,
    ) -> std::result::Result<Arc<dyn DirectoryCapability>, SaveError> {
        let record = self
            .handles
            .get(VAULT_KEY)
            .map_err(|e| SaveError::Storage(e.to_string()))?;

        match record {
            Some(record) => match self.platform.restore(&record) {
                Ok(handle) => {
                    tracing::debug!("Using stored folder {}", handle.name());
                    Ok(handle)
                }
                Err(e) => {
                    tracing::error!("Stored folder {} cannot be restored: {}", record.name, e);
                    self.evict();
                    Err(SaveError::HandlePermanentlyInvalid)
                }
            },
            None => self.pick_handle().await,
        }
    }

    async fn pick_handle(&self) -> std::result::Result<Arc<dyn DirectoryCapability>, SaveError> {
        self.enter(SaveState::PickHandle);
        let handle = self.platform.pick_directory().await.map_err(|e| match e.kind {
            AccessErrorKind::Aborted => SaveError::UserCancelled,
            _ => SaveError::FolderSelection(e.message),
        })?;

        self.handles
            .put(VAULT_KEY, &handle.record())
            .map_err(|e| SaveError::Storage(e.to_string()))?;

        if let Some(settings) = &self.settings {
            if let Err(e) = settings.set_folder_name(handle.name()) {
                tracing::warn!("Failed to cache folder name: {}", e);
            }
        }

        tracing::info!("Folder {} selected", handle.name());
        Ok(handle)
    }

    async fn summarize(
        &self,
        conversation: &Conversation,
        api_key: &str,
    ) -> std::result::Result<String, SaveError> {
        summarize_with_deadline(
            self.summarizer.as_ref(),
            conversation,
            api_key,
            self.summary_timeout,
        )
        .await
    }

    /// Delete the stored handle; true when it is gone afterwards
    fn evict(&self) -> bool {
        match self.handles.delete(VAULT_KEY) {
            Ok(()) => {
                tracing::warn!("Stored folder evicted");
                self.clear_folder_name();
                true
            }
            Err(e) => {
                tracing::error!("Failed to evict stored folder: {}", e);
                false
            }
        }
    }

    fn clear_folder_name(&self) {
        if let Some(settings) = &self.settings {
            if let Err(e) = settings.clear_folder_name() {
                tracing::warn!("Failed to clear cached folder name: {}", e);
            }
        }
    }
}

async fn write_document(dir: &dyn DirectoryCapability, document: &Document) -> AccessResult<()> {
    let mut file = dir.create_file(&document.filename).await?;
    file.write_all(document.content.as_bytes()).await?;
    file.close().await
}
