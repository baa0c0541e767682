//! `chatvault save`
//!
//! Runs the save pipeline for one exported conversation and reports the
//! outcome. Hosts without directory access fall back to the downloads folder.

use super::{build_orchestrator, summary_timeout};
use crate::config::Config;
use crate::conversation::Conversation;
use crate::document::DocumentBuilder;
use crate::error::{ChatvaultError, Result};
use crate::fallback::{save_to_downloads, FallbackOutcome};
use crate::orchestrator::{summarize_with_deadline, SaveObserver, SaveOutcome, SaveState};
use crate::platform::{AutoApprovePrompter, Prompter, TerminalPrompter};
use crate::storage::{self, HistoryEntry, SettingsStore};
use crate::summarizer::ChatCompletionSummarizer;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

fn print_progress(state: SaveState) {
    match state {
        SaveState::Start | SaveState::Done | SaveState::Abort => {}
        other => println!("{}", format!("  {}...", other).dimmed()),
    }
}

fn history_entry(conversation: &Conversation) -> HistoryEntry {
    HistoryEntry {
        title: conversation.title.clone(),
        url: conversation.url.clone(),
        timestamp: conversation.timestamp,
    }
}

fn record_history(settings: &SettingsStore, conversation: &Conversation) {
    if let Err(e) = settings.append_history(history_entry(conversation)) {
        tracing::warn!("Failed to record history: {}", e);
    }
}

/// Save the conversation in `conversation_path`
///
/// # Errors
///
/// Returns error if the conversation cannot be loaded, a store cannot be
/// opened, or the save fails
pub async fn run_save(config: Config, conversation_path: &Path, yes: bool) -> Result<()> {
    let conversation = Conversation::from_json_file(conversation_path)?;
    tracing::info!(
        "Saving \"{}\" ({} messages)",
        conversation.title,
        conversation.messages.len()
    );

    let settings = Arc::new(storage::open_settings_store()?);
    let prompter: Arc<dyn Prompter> = if yes {
        Arc::new(AutoApprovePrompter::default())
    } else {
        Arc::new(TerminalPrompter)
    };
    let observer: Arc<dyn SaveObserver> = Arc::new(print_progress);
    let orchestrator = build_orchestrator(&config, prompter, Arc::clone(&settings), observer)?;

    let outcome = orchestrator.save(&conversation, &config).await;
    match &outcome {
        SaveOutcome::Saved { .. } => {
            record_history(&settings, &conversation);
            println!("{}", outcome.notification().green());
        }
        SaveOutcome::Unsupported => {
            println!("{}", outcome.notification().yellow());
            println!("Saving to the downloads folder instead");
            save_via_download(&config, &conversation, &settings).await?;
        }
        SaveOutcome::Cancelled => println!("{}", outcome.notification().yellow()),
        SaveOutcome::PermissionNeeded | SaveOutcome::ReselectFolder => {
            println!("{}", outcome.notification().yellow());
            println!(
                "Use {} to choose a folder.",
                "chatvault folder pick".cyan()
            );
        }
        SaveOutcome::Failed { message } => {
            return Err(ChatvaultError::Save(message.clone()).into());
        }
    }

    Ok(())
}

async fn save_via_download(
    config: &Config,
    conversation: &Conversation,
    settings: &SettingsStore,
) -> Result<()> {
    if config.api_key.trim().is_empty() {
        return Err(ChatvaultError::Save(
            "Please set an API key first (chatvault config set --api-key)".to_string(),
        )
        .into());
    }

    let summarizer = ChatCompletionSummarizer::new(config.summarizer.clone());
    let summary = summarize_with_deadline(
        &summarizer,
        conversation,
        &config.api_key,
        summary_timeout(config),
    )
    .await
    .map_err(|e| ChatvaultError::Save(e.to_string()))?;

    let document = DocumentBuilder::local().build(conversation, &summary);
    match save_to_downloads(&document, config.downloads_dir.as_deref(), settings)? {
        FallbackOutcome::Downloaded(path) => {
            record_history(settings, conversation);
            println!("{}", format!("Saved to {}", path.display()).green());
            Ok(())
        }
        FallbackOutcome::BackedUp { reason } => Err(ChatvaultError::Save(format!(
            "Download failed ({}); the note was kept as a backup, see `chatvault backups`",
            reason
        ))
        .into()),
    }
}
