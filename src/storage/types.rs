use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A successfully saved conversation, shown in the history list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Conversation title
    pub title: String,
    /// Origin URL of the conversation
    pub url: String,
    /// When the note was saved
    pub timestamp: DateTime<Utc>,
}

/// A rendered note kept because it could not be written anywhere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// File name the note would have been saved under
    pub filename: String,
    /// Full note content
    pub content: String,
    /// When the backup was taken
    pub saved_at: DateTime<Utc>,
}
