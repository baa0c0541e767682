//! Command-line interface definition for Chatvault
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for saving conversations, managing the chosen
//! folder, editing settings and browsing history.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chatvault - save summarized chat conversations as Markdown notes
///
/// Summarizes an exported conversation with a chat completions API and
/// writes the note into a folder you granted access to.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Directory holding the handle and settings stores
    #[arg(long, env = "CHATVAULT_DATA_DIR")]
    pub data_dir: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Chatvault
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Summarize a conversation and save it as a note
    Save {
        /// Conversation JSON file (title, messages, url, timestamp)
        conversation: PathBuf,

        /// Grant write permission without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage the folder notes are saved into
    Folder {
        /// Folder subcommand
        #[command(subcommand)]
        command: FolderCommand,
    },

    /// Show or change settings
    Config {
        /// Config subcommand
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Check that the API key and endpoint work
    TestApi,

    /// Show recently saved conversations
    History {
        /// Maximum number of entries to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// List notes kept because they could not be written
    Backups,
}

/// Folder management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum FolderCommand {
    /// Choose the folder notes are saved into
    Pick {
        /// Folder to use; prompts when omitted
        path: Option<PathBuf>,
    },

    /// Show the chosen folder
    Show,

    /// Forget the chosen folder
    Forget,
}

/// Settings subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Update settings and write them to the config file
    Set {
        /// API key for the summarization service
        #[arg(long)]
        api_key: Option<String>,

        /// Subfolder notes are saved into (blank resets to the default)
        #[arg(long)]
        subfolder: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
