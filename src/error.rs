//! Error types for Chatvault
//!
//! This module defines the crate-wide error enum used by configuration,
//! storage and command plumbing, using `thiserror` for ergonomic error
//! handling. Errors on the save path are classified separately (see
//! [`crate::orchestrator::SaveError`], [`crate::platform::AccessError`] and
//! [`crate::summarizer::SummaryError`]) so that callers only ever see a
//! classified outcome.

use thiserror::Error;

/// Main error type for Chatvault operations
#[derive(Error, Debug)]
pub enum ChatvaultError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Handle store and settings store errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// The conversation supplied by the extractor is not usable
    #[error("Invalid conversation: {0}")]
    InvalidConversation(String),

    /// Interactive prompt failures (terminal not available, readline errors)
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// A save attempt ended in a failure outcome; carries the user-facing message
    #[error("{0}")]
    Save(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for Chatvault operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
