//! Chatvault - save summarized chat conversations as Markdown notes
//!
//! This library takes an exported chat conversation, asks a chat completions
//! API for a short summary, renders summary and transcript as a Markdown note
//! with front-matter, and writes it into a folder the user granted access to.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `conversation`: the conversation value handed in by an extractor
//! - `platform`: host file-access abstraction and the local filesystem adapter
//! - `storage`: SQLite handle store and `sled` settings store
//! - `permission`: write-permission checks on stored handles
//! - `summarizer`: the remote summarization client
//! - `document`: Markdown note and file name rendering
//! - `orchestrator`: the save pipeline and its classified outcomes
//! - `fallback`: downloads-folder save for hosts without directory access
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use chatvault::platform::{LocalPlatform, TerminalPrompter};
//! use chatvault::storage::SqliteHandleStore;
//! use chatvault::summarizer::ChatCompletionSummarizer;
//! use chatvault::{Config, Conversation, SaveOrchestrator};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml")?;
//!     config.validate()?;
//!
//!     let orchestrator = SaveOrchestrator::new(
//!         Arc::new(LocalPlatform::new(Arc::new(TerminalPrompter))),
//!         Arc::new(SqliteHandleStore::new("handles.db")?),
//!         Arc::new(ChatCompletionSummarizer::new(config.summarizer.clone())),
//!     );
//!     let conversation = Conversation::from_json_file("conversation.json")?;
//!     println!("{}", orchestrator.save(&conversation, &config).await.notification());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod document;
pub mod error;
pub mod fallback;
pub mod orchestrator;
pub mod permission;
pub mod platform;
pub mod prompts;
pub mod storage;
pub mod summarizer;

// Re-export commonly used types
pub use config::Config;
pub use conversation::{Conversation, Message, Role};
pub use document::{Document, DocumentBuilder};
pub use error::{ChatvaultError, Result};
pub use orchestrator::{SaveObserver, SaveOrchestrator, SaveOutcome, SaveState};
pub use permission::{PermissionGate, PermissionOutcome};

#[cfg(test)]
pub mod test_utils;
