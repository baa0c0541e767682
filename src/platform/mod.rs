//! Host file-access abstraction
//!
//! The save pipeline never touches a concrete filesystem type. A host adapts
//! its native folder-access primitive to [`DirectoryCapability`] and exposes
//! the picker and rehydration of stored handles through
//! [`FileAccessPlatform`]. Every error coming out of these traits is already
//! classified as an [`AccessError`].
//!
//! Implementations:
//!
//! - [`local::LocalPlatform`]: directories on the local filesystem, with
//!   interactive consent through a [`prompter::Prompter`]
//! - [`UnsupportedPlatform`]: a host without directory access at all

pub mod local;
pub mod prompter;

pub use local::{LocalDirectory, LocalPlatform};
pub use prompter::{AutoApprovePrompter, Prompter, TerminalPrompter};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Access mode a permission is queried or requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionMode {
    /// Read-only access
    Read,
    /// Read and write access
    ReadWrite,
}

/// Current permission state of a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    /// Access is currently granted
    Granted,
    /// Access was refused
    Denied,
    /// Access must be requested interactively
    Prompt,
}

/// Class of a platform access failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessErrorKind {
    /// The grant was revoked or the location is not writable
    NotAllowed,
    /// The location no longer exists
    NotFound,
    /// The user dismissed an interactive dialog
    Aborted,
    /// Anything else
    Other,
}

impl AccessErrorKind {
    /// True when the handle that produced this error can never be used again
    ///
    /// # Examples
    ///
    /// ```
    /// use chatvault::platform::AccessErrorKind;
    ///
    /// assert!(AccessErrorKind::NotFound.is_terminal());
    /// assert!(!AccessErrorKind::Aborted.is_terminal());
    /// ```
    pub fn is_terminal(self) -> bool {
        matches!(self, AccessErrorKind::NotAllowed | AccessErrorKind::NotFound)
    }
}

/// A classified platform access failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind:?}: {message}")]
pub struct AccessError {
    /// Failure class
    pub kind: AccessErrorKind,
    /// Platform message
    pub message: String,
}

impl AccessError {
    /// Create an error of the given kind
    pub fn new(kind: AccessErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a `NotAllowed` error
    pub fn not_allowed(message: impl Into<String>) -> Self {
        Self::new(AccessErrorKind::NotAllowed, message)
    }

    /// Shorthand for a `NotFound` error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(AccessErrorKind::NotFound, message)
    }

    /// Shorthand for an `Aborted` error
    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(AccessErrorKind::Aborted, message)
    }

    /// Shorthand for an unclassified error
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(AccessErrorKind::Other, message)
    }

    /// Classify an IO error raised while touching a directory or file
    pub fn from_io(err: &std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => AccessErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => AccessErrorKind::NotAllowed,
            _ => AccessErrorKind::Other,
        };
        Self::new(kind, err.to_string())
    }

    /// See [`AccessErrorKind::is_terminal`]
    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

/// Result of a platform call
pub type AccessResult<T> = std::result::Result<T, AccessError>;

/// Serializable form of a directory capability
///
/// `payload` is only meaningful to the platform that produced the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandleRecord {
    /// Display name of the directory
    pub name: String,
    /// Platform-specific locator
    pub payload: serde_json::Value,
}

/// An open file inside a directory capability
#[async_trait]
pub trait FileWriter: Send {
    /// Write the whole buffer
    async fn write_all(&mut self, bytes: &[u8]) -> AccessResult<()>;

    /// Flush and close the file
    async fn close(self: Box<Self>) -> AccessResult<()>;
}

/// A revocable reference to a user-granted directory
#[async_trait]
pub trait DirectoryCapability: Send + Sync {
    /// Display name of the directory
    fn name(&self) -> &str;

    /// Serializable form for the handle store
    fn record(&self) -> HandleRecord;

    /// Current permission state; fails when the handle is stale
    async fn query_permission(&self, mode: PermissionMode) -> AccessResult<PermissionState>;

    /// Ask the user for access; may show a dialog
    async fn request_permission(&self, mode: PermissionMode) -> AccessResult<PermissionState>;

    /// Open a child directory, creating it when `create` is set
    async fn get_child_directory(
        &self,
        name: &str,
        create: bool,
    ) -> AccessResult<Arc<dyn DirectoryCapability>>;

    /// Create or truncate a file in this directory
    async fn create_file(&self, name: &str) -> AccessResult<Box<dyn FileWriter>>;
}

/// Host-level entry points for directory access
#[async_trait]
pub trait FileAccessPlatform: Send + Sync {
    /// False when the host has no directory access capability at all
    fn supports_directory_access(&self) -> bool;

    /// Show the folder chooser restricted to read-write mode
    ///
    /// User cancellation is reported as [`AccessErrorKind::Aborted`].
    async fn pick_directory(&self) -> AccessResult<Arc<dyn DirectoryCapability>>;

    /// Rehydrate a capability from a stored record
    ///
    /// Restoring does not check that the directory still exists; staleness
    /// surfaces on the first permission query.
    fn restore(&self, record: &HandleRecord) -> AccessResult<Arc<dyn DirectoryCapability>>;
}

/// A host without directory access
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedPlatform;

#[async_trait]
impl FileAccessPlatform for UnsupportedPlatform {
    fn supports_directory_access(&self) -> bool {
        false
    }

    async fn pick_directory(&self) -> AccessResult<Arc<dyn DirectoryCapability>> {
        Err(AccessError::other("directory access is not supported"))
    }

    fn restore(&self, _record: &HandleRecord) -> AccessResult<Arc<dyn DirectoryCapability>> {
        Err(AccessError::other("directory access is not supported"))
    }
}
