//! Initialize Citations.

use super::{get_paths, load_config, open_database};
use anyhow::{Context, Result};
use citations_config::{Config, ConfigStore};
use citations_db::Database;
use colored::Colorize;

pub fn run(store: &ConfigStore) -> Result<()> {
    let paths = get_paths()?;

    if store.path().exists() {
        let config = load_config(store)?;
        let index_dir = config.index.data_dir(&paths);
        println!("{} Citations is already initialized.", "Note:".yellow().bold());
        println!("  Config: {}", store.path().display());
        println!("  Index: {}", Database::index_file(&index_dir).display());
        return Ok(());
    }

    println!("{}", "Initializing Citations...".cyan().bold());

    Config::create_default_file(store.path()).context("Failed to create config file")?;
    println!("  {} Created config: {}", "✓".green(), store.path().display());

    let config = load_config(store)?;
    let index_dir = config.index.data_dir(&paths);
    let _db = open_database(&index_dir)?;
    println!(
        "  {} Created index: {}",
        "✓".green(),
        Database::index_file(&index_dir).display()
    );

    println!();
    println!("{}", "Citations initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!(
        "  1. Add an archive directory: {}",
        "citations config add-dir ~/archivebox/archive --type archive".cyan()
    );
    println!(
        "  2. Add a notes directory: {}",
        "citations config add-dir ~/notes --type markdown --meta source=notes".cyan()
    );
    println!("  3. Index everything: {}", "citations scan".cyan());

    Ok(())
}
