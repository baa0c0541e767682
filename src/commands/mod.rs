//! Command handlers for the Chatvault CLI
//!
//! Each submodule implements one top-level command. The helpers here wire
//! the configuration into the platform, stores and summarizer shared by the
//! save and folder commands.

use crate::config::Config;
use crate::error::Result;
use crate::orchestrator::{SaveObserver, SaveOrchestrator};
use crate::platform::{FileAccessPlatform, LocalPlatform, Prompter, UnsupportedPlatform};
use crate::storage::{self, SettingsStore};
use crate::summarizer::ChatCompletionSummarizer;
use std::sync::Arc;
use std::time::Duration;

pub mod config;
pub mod folder;
pub mod history;
pub mod save;

/// Platform allowed by `config`
pub fn platform_for(config: &Config, prompter: Arc<dyn Prompter>) -> Arc<dyn FileAccessPlatform> {
    if config.directory_access {
        Arc::new(LocalPlatform::new(prompter))
    } else {
        tracing::debug!("Directory access disabled by configuration");
        Arc::new(UnsupportedPlatform)
    }
}

/// Summary deadline from `config`; zero disables it
pub fn summary_timeout(config: &Config) -> Option<Duration> {
    match config.summarizer.timeout_seconds {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    }
}

/// Build an orchestrator over the stores in the data directory
///
/// # Errors
///
/// Returns error if the handle store cannot be opened
pub fn build_orchestrator(
    config: &Config,
    prompter: Arc<dyn Prompter>,
    settings: Arc<SettingsStore>,
    observer: Arc<dyn SaveObserver>,
) -> Result<SaveOrchestrator> {
    let handles = Arc::new(storage::open_handle_store()?);
    let summarizer = Arc::new(ChatCompletionSummarizer::new(config.summarizer.clone()));

    Ok(
        SaveOrchestrator::new(platform_for(config, prompter), handles, summarizer)
            .with_settings(settings)
            .with_summary_timeout(summary_timeout(config))
            .with_observer(observer),
    )
}
