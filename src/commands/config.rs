//! `chatvault config` subcommands and `chatvault test-api`

use crate::cli::ConfigCommand;
use crate::config::Config;
use crate::error::{ChatvaultError, Result};
use crate::summarizer::ChatCompletionSummarizer;
use colored::Colorize;

/// Handle config commands; `config_path` is where `set` writes to
///
/// `show` displays the effective configuration. `set` starts from the file
/// alone so environment overrides are never written back.
pub fn handle_config(config: Config, config_path: &str, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            show(&config);
            Ok(())
        }
        ConfigCommand::Set { api_key, subfolder } => {
            let on_disk = Config::load_file_only(config_path)?;
            set(on_disk, config_path, api_key, subfolder)
        }
    }
}

/// Mask an API key for display
fn mask_key(key: &str) -> String {
    if key.is_empty() {
        return "(not set)".to_string();
    }
    let visible: String = key.chars().take(4).collect();
    if key.chars().count() <= 8 {
        "********".to_string()
    } else {
        format!("{}********", visible)
    }
}

fn show(config: &Config) {
    println!("{}", "Configuration".bold());
    println!("  api_key:          {}", mask_key(&config.api_key));
    println!("  subfolder:        {}", config.subfolder);
    println!("  directory_access: {}", config.directory_access);
    println!("  api_base:         {}", config.summarizer.api_base);
    println!("  model:            {}", config.summarizer.model);
    println!("  temperature:      {}", config.summarizer.temperature);
    match config.summarizer.timeout_seconds {
        0 => println!("  timeout:          none"),
        secs => println!("  timeout:          {}s", secs),
    }
    if let Some(dir) = &config.downloads_dir {
        println!("  downloads_dir:    {}", dir.display());
    }
}

fn set(
    mut config: Config,
    config_path: &str,
    api_key: Option<String>,
    subfolder: Option<String>,
) -> Result<()> {
    if api_key.is_none() && subfolder.is_none() {
        return Err(ChatvaultError::Config(
            "Nothing to set; pass --api-key and/or --subfolder".to_string(),
        )
        .into());
    }

    if let Some(key) = api_key {
        config.api_key = key.trim().to_string();
    }
    if let Some(subfolder) = subfolder {
        config.set_subfolder(&subfolder);
    }

    config.validate()?;
    config.save(config_path)?;
    println!("{}", format!("Settings saved to {}", config_path).green());
    Ok(())
}

/// Send a minimal request to the summarization API
///
/// # Errors
///
/// Returns error if no API key is configured or the request fails
pub async fn test_api(config: &Config) -> Result<()> {
    if config.api_key.trim().is_empty() {
        return Err(ChatvaultError::Config(
            "Please set an API key first (chatvault config set --api-key)".to_string(),
        )
        .into());
    }

    println!("Testing {} ...", config.summarizer.api_base);
    let summarizer = ChatCompletionSummarizer::new(config.summarizer.clone());
    summarizer
        .check_connection(&config.api_key)
        .await
        .map_err(|e| ChatvaultError::Save(format!("API test failed: {}", e.upstream_message())))?;

    println!("{}", "API connection OK".green());
    Ok(())
}
