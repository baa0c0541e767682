//! Write permission checks for stored directory handles
//!
//! A stored handle says nothing about whether writing is allowed right now.
//! [`PermissionGate::ensure_writable`] re-checks before every use and tells
//! the caller whether a refusal is worth retrying later or whether the handle
//! is gone for good.
//!
//! Interactive requests may need a direct user action on some hosts, so the
//! gate must be driven from the user-initiated save, never from a timer.

use crate::platform::{
    AccessError, AccessErrorKind, DirectoryCapability, PermissionMode, PermissionState,
};

/// Result of a permission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionOutcome {
    /// Write access is granted now
    pub granted: bool,
    /// The handle is permanently unusable and must be evicted
    pub fatal: bool,
}

impl PermissionOutcome {
    /// Access granted
    pub const GRANTED: Self = Self {
        granted: true,
        fatal: false,
    };

    /// Refused for now; a later attempt may succeed
    pub const DENIED: Self = Self {
        granted: false,
        fatal: false,
    };

    /// Handle is permanently invalid
    pub const FATAL: Self = Self {
        granted: false,
        fatal: true,
    };
}

/// Ensures read-write access on a directory capability
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissionGate;

impl PermissionGate {
    /// Create a gate
    pub fn new() -> Self {
        Self
    }

    /// Make sure `handle` is writable, asking the user if needed
    ///
    /// Only a `Granted` answer from the platform yields `granted: true`.
    /// When the query itself fails the request is attempted once more; if
    /// that fails too the handle is reported as fatal.
    pub async fn ensure_writable(&self, handle: &dyn DirectoryCapability) -> PermissionOutcome {
        match handle.query_permission(PermissionMode::ReadWrite).await {
            Ok(PermissionState::Granted) => {
                tracing::debug!("Write permission already granted for {}", handle.name());
                PermissionOutcome::GRANTED
            }
            Ok(state) => {
                tracing::debug!(
                    "Write permission for {} is {:?}, requesting",
                    handle.name(),
                    state
                );
                match handle.request_permission(PermissionMode::ReadWrite).await {
                    Ok(PermissionState::Granted) => PermissionOutcome::GRANTED,
                    Ok(_) => {
                        tracing::info!("Write permission declined for {}", handle.name());
                        PermissionOutcome::DENIED
                    }
                    Err(e) => Self::classify(handle, &e),
                }
            }
            Err(query_error) => {
                tracing::warn!(
                    "Permission query failed for {}: {}; requesting once",
                    handle.name(),
                    query_error
                );
                match handle.request_permission(PermissionMode::ReadWrite).await {
                    Ok(PermissionState::Granted) => PermissionOutcome::GRANTED,
                    Ok(_) => PermissionOutcome::DENIED,
                    Err(e) => {
                        tracing::error!(
                            "Permission request failed for {} after query error: {}",
                            handle.name(),
                            e
                        );
                        PermissionOutcome::FATAL
                    }
                }
            }
        }
    }

    fn classify(handle: &dyn DirectoryCapability, error: &AccessError) -> PermissionOutcome {
        if error.is_terminal() {
            tracing::error!("Handle for {} is no longer valid: {}", handle.name(), error);
            PermissionOutcome::FATAL
        } else {
            if error.kind == AccessErrorKind::Aborted {
                tracing::info!("Permission dialog dismissed for {}", handle.name());
            } else {
                tracing::warn!("Permission request failed for {}: {}", handle.name(), error);
            }
            PermissionOutcome::DENIED
        }
    }
}
