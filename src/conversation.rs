//! Conversation data model
//!
//! A [`Conversation`] is produced once per save attempt by whatever extracts
//! the chat from its host page, and is immutable afterwards. The save path
//! requires at least one message.

use crate::error::{ChatvaultError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Speaker of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person chatting
    User,
    /// The chat assistant
    Assistant,
}

impl Role {
    /// Label used for this speaker in prompts and transcript headings
    ///
    /// # Examples
    ///
    /// ```
    /// use chatvault::conversation::Role;
    ///
    /// assert_eq!(Role::User.label(), "我");
    /// assert_eq!(Role::Assistant.label(), "ChatGPT");
    /// ```
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "我",
            Role::Assistant => "ChatGPT",
        }
    }
}

/// A single chat message; content is plain text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent the message
    pub role: Role,
    /// Plain text content
    pub content: String,
}

impl Message {
    /// Creates a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A scraped conversation ready to be summarized and saved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation title as shown by the host page
    pub title: String,
    /// Messages in display order
    pub messages: Vec<Message>,
    /// Origin URL of the conversation
    pub url: String,
    /// Extraction instant (ISO-8601)
    pub timestamp: DateTime<Utc>,
}

impl Conversation {
    /// Load a conversation from a JSON file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid JSON, or fails
    /// [`Conversation::validate`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ChatvaultError::InvalidConversation(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))
        })?;
        let conversation: Conversation = serde_json::from_str(&contents).map_err(|e| {
            ChatvaultError::InvalidConversation(format!(
                "Failed to parse {}: {}",
                path.display(),
                e
            ))
        })?;
        conversation.validate()?;
        Ok(conversation)
    }

    /// Check the preconditions the save path relies on
    ///
    /// # Errors
    ///
    /// Returns `ChatvaultError::InvalidConversation` when there are no messages.
    pub fn validate(&self) -> Result<()> {
        if self.messages.is_empty() {
            return Err(ChatvaultError::InvalidConversation(
                "conversation has no messages".to_string(),
            )
            .into());
        }
        Ok(())
    }
}
