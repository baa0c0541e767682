//! `chatvault folder` subcommands

use super::build_orchestrator;
use crate::cli::FolderCommand;
use crate::config::Config;
use crate::error::{ChatvaultError, Result};
use crate::orchestrator::{NoopObserver, SaveError};
use crate::platform::{AutoApprovePrompter, HandleRecord, Prompter, TerminalPrompter};
use crate::storage::{self, HandleStore, VAULT_KEY};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

/// Handle folder commands
pub async fn handle_folder(config: Config, command: FolderCommand) -> Result<()> {
    match command {
        FolderCommand::Pick { path } => pick(&config, path).await,
        FolderCommand::Show => show(),
        FolderCommand::Forget => forget(&config),
    }
}

async fn pick(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let prompter: Arc<dyn Prompter> = match path {
        Some(path) => Arc::new(AutoApprovePrompter::new(Some(path))),
        None => Arc::new(TerminalPrompter),
    };
    let settings = Arc::new(storage::open_settings_store()?);
    let orchestrator = build_orchestrator(config, prompter, settings, Arc::new(NoopObserver))?;

    match orchestrator.pick_folder().await {
        Ok(name) => {
            println!("{}", format!("Notes will be saved into {}", name).green());
            Ok(())
        }
        Err(SaveError::UserCancelled) => {
            println!("{}", "Folder selection cancelled".yellow());
            Ok(())
        }
        Err(e) => Err(ChatvaultError::Save(e.to_string()).into()),
    }
}

/// Local path stored in a handle record, if the record came from the local platform
fn record_path(record: &HandleRecord) -> Option<&str> {
    record.payload.get("path").and_then(|p| p.as_str())
}

fn show() -> Result<()> {
    let handles = storage::open_handle_store()?;
    let settings = storage::open_settings_store()?;

    match handles.get(VAULT_KEY)? {
        Some(record) => {
            println!("Folder: {}", record.name.cyan());
            if let Some(path) = record_path(&record) {
                println!("Path:   {}", path);
            }
        }
        None => {
            let cached = settings.folder_name()?;
            match cached {
                Some(name) => println!(
                    "{}",
                    format!("No stored folder (last chosen: {})", name).yellow()
                ),
                None => println!("{}", "No folder chosen yet.".yellow()),
            }
            println!(
                "Use {} to choose one.",
                "chatvault folder pick <path>".cyan()
            );
        }
    }
    Ok(())
}

fn forget(config: &Config) -> Result<()> {
    let settings = Arc::new(storage::open_settings_store()?);
    let orchestrator = build_orchestrator(
        config,
        Arc::new(AutoApprovePrompter::default()),
        settings,
        Arc::new(NoopObserver),
    )?;
    orchestrator
        .forget_folder()
        .map_err(|e| ChatvaultError::Storage(e.to_string()))?;
    println!("{}", "Stored folder forgotten".green());
    Ok(())
}
