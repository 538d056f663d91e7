//! Stats command - show index statistics.

use super::{format_size, index_dir, load_config, open_database};
use anyhow::Result;
use citations_config::ConfigStore;
use citations_core::epoch;
use colored::Colorize;

pub fn run(store: &ConfigStore) -> Result<()> {
    let config = load_config(store)?;
    let dir = index_dir(&config, None)?;
    let db = open_database(&dir)?;
    let stats = db.get_stats()?;

    println!("{}", "Citations Statistics".cyan().bold());
    println!("{}", "─".repeat(50));

    println!();
    println!("{}", "Index".white().bold());
    if let Some(file) = db.file() {
        println!("  Location:   {}", file.display());
    }
    println!("  Size:       {}", format_size(db.file_size()?));
    match db.verify() {
        Ok(()) => println!("  Integrity:  {}", "ok".green()),
        Err(e) => println!("  Integrity:  {}", e.to_string().red()),
    }
    println!("  Chunks:     {}", stats.total_chunks.to_string().green());
    println!("  Embeddings: {}", stats.total_embeddings);

    if !stats.collections.is_empty() {
        println!();
        println!("{}", "Collections".white().bold());
        for collection in &stats.collections {
            let marker = if collection.name == config.index.collection {
                "*".green()
            } else {
                " ".normal()
            };
            println!(
                "  {} {:<20} {:>8} chunks {:>8} embedded {:>6} files",
                marker, collection.name, collection.chunks, collection.embedded, collection.sources
            );
        }
    }

    println!();
    println!("{}", "Scanning".white().bold());
    if config.last_scan_time == epoch() {
        println!("  Last scan:  {}", "never".dimmed());
    } else {
        println!("  Last scan:  {}", config.last_scan_time.to_rfc3339());
    }
    println!("  Targets:    {}", config.data_dirs.len());
    for target in &config.data_dirs {
        println!(
            "    {} {} {}",
            "•".cyan(),
            target.directory.display(),
            format!("[{}]", target.kind).dimmed()
        );
    }

    Ok(())
}
