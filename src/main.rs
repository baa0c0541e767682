//! Chatvault - save summarized chat conversations as Markdown notes
//!
#![doc = "Chatvault CLI"]
#![doc = "Main entry point for the Chatvault application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatvault::cli::{Cli, Commands};
use chatvault::commands;
use chatvault::config::Config;
use chatvault::storage::DATA_DIR_ENV;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Mirror a CLI data directory into the environment so the store
    // openers pick it up.
    if let Some(dir) = &cli.data_dir {
        std::env::set_var(DATA_DIR_ENV, dir);
        tracing::debug!("Using data directory override: {}", dir);
    }

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Save { conversation, yes } => {
            tracing::debug!("Loading conversation from: {}", conversation.display());
            commands::save::run_save(config, &conversation, yes).await
        }
        Commands::Folder { command } => commands::folder::handle_folder(config, command).await,
        Commands::Config { command } => {
            commands::config::handle_config(config, config_path, command)
        }
        Commands::TestApi => commands::config::test_api(&config).await,
        Commands::History { limit } => commands::history::show_history(limit),
        Commands::Backups => commands::history::show_backups(),
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "chatvault=debug"
    } else {
        "chatvault=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
