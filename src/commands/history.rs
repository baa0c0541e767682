use crate::error::Result;
use crate::storage::{self, BackupEntry, HistoryEntry};
use colored::Colorize;
use prettytable::{format, Table};

fn truncate_title(title: &str) -> String {
    if title.chars().count() > 40 {
        format!("{}...", title.chars().take(37).collect::<String>())
    } else {
        title.to_string()
    }
}

fn history_table(entries: &[HistoryEntry]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "Saved".bold(),
        "Title".bold(),
        "URL".bold()
    ]);

    for entry in entries {
        let saved = entry
            .timestamp
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        table.add_row(prettytable::row![
            saved.cyan(),
            truncate_title(&entry.title),
            entry.url
        ]);
    }

    table
}

/// Show the most recent `limit` saved conversations
pub fn show_history(limit: usize) -> Result<()> {
    let settings = storage::open_settings_store()?;
    let history = settings.history()?;

    if history.is_empty() {
        println!("{}", "No saved conversations yet.".yellow());
        return Ok(());
    }

    let shown = &history[..limit.min(history.len())];
    println!("\nSaved Conversations:");
    history_table(shown).printstd();
    if shown.len() < history.len() {
        println!(
            "Showing {} of {}. Use {} to see more.",
            shown.len(),
            history.len(),
            "--limit".cyan()
        );
    }
    println!();

    Ok(())
}

fn backups_table(entries: &[BackupEntry]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "Kept".bold(),
        "File".bold(),
        "Size".bold()
    ]);

    // Newest first
    for entry in entries.iter().rev() {
        let kept = entry
            .saved_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        table.add_row(prettytable::row![
            kept.cyan(),
            entry.filename,
            format!("{} B", entry.content.len())
        ]);
    }

    table
}

/// List notes kept after a failed download save
pub fn show_backups() -> Result<()> {
    let settings = storage::open_settings_store()?;
    let backups = settings.backups()?;

    if backups.is_empty() {
        println!("{}", "No backups stored.".yellow());
        return Ok(());
    }

    println!("\nBackups:");
    backups_table(&backups).printstd();
    println!();

    Ok(())
}
