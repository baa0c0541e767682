//! Interactive consent for the local platform
//!
//! The local platform asks the user before granting write access and when
//! choosing a folder. [`TerminalPrompter`] reads answers with `rustyline`;
//! [`AutoApprovePrompter`] answers yes without asking (`--yes`).

use crate::error::{ChatvaultError, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

/// Source of interactive answers
pub trait Prompter: Send + Sync {
    /// Ask a yes/no question
    fn confirm(&self, question: &str) -> Result<bool>;

    /// Ask for a directory; `None` means the user cancelled
    fn choose_directory(&self) -> Result<Option<PathBuf>>;
}

/// Prompter reading from the controlling terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn read_line(prompt: &str) -> Result<Option<String>> {
        let mut rl = DefaultEditor::new().map_err(|e| ChatvaultError::Prompt(e.to_string()))?;
        match rl.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(ChatvaultError::Prompt(e.to_string()).into()),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, question: &str) -> Result<bool> {
        let answer = Self::read_line(&format!("{} [y/N] ", question))?;
        Ok(answer.map(|a| is_yes(&a)).unwrap_or(false))
    }

    fn choose_directory(&self) -> Result<Option<PathBuf>> {
        let answer = Self::read_line("Folder to save notes into: ")?;
        Ok(answer
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .map(PathBuf::from))
    }
}

/// Prompter that approves every request
///
/// `directory` is returned from the folder chooser; without one the chooser
/// behaves as if the user cancelled.
#[derive(Debug, Default, Clone)]
pub struct AutoApprovePrompter {
    directory: Option<PathBuf>,
}

impl AutoApprovePrompter {
    /// Create a prompter that picks `directory` when asked for a folder
    pub fn new(directory: Option<PathBuf>) -> Self {
        Self { directory }
    }
}

impl Prompter for AutoApprovePrompter {
    fn confirm(&self, question: &str) -> Result<bool> {
        tracing::debug!("Auto-approving: {}", question);
        Ok(true)
    }

    fn choose_directory(&self) -> Result<Option<PathBuf>> {
        Ok(self.directory.clone())
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
