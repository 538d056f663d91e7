//! Search command - semantic and full-text search over the index.

use super::{ensure_collection, index_dir, load_config, open_database, truncate};
use anyhow::{Context, Result};
use citations_config::{Config, ConfigStore};
use citations_db::{Database, SimilarityResult};
use citations_ollama::OllamaClient;
use colored::Colorize;
use tokio::runtime::Runtime;

pub fn run(
    store: &ConfigStore,
    query: &str,
    limit: usize,
    keyword: bool,
    collection: Option<String>,
) -> Result<()> {
    let config = load_config(store)?;
    let collection = collection.unwrap_or_else(|| config.index.collection.clone());
    let db = open_database(&index_dir(&config, None)?)?;
    ensure_collection(&db, &collection)?;

    let results = if keyword {
        println!("{} \"{}\"", "Searching for:".cyan().bold(), query);
        db.keyword_search(&collection, query, limit)
            .context("Full-text search failed")?
    } else {
        println!(
            "{} \"{}\" {}",
            "Semantic search for:".cyan().bold(),
            query,
            "(meaning-based)".dimmed()
        );
        semantic_search(&db, &config, &collection, query, limit)?
    };
    println!("{}", "─".repeat(70));

    if results.is_empty() {
        println!();
        println!("{}", "No results found.".dimmed());
        println!();
        println!("Tips:");
        println!("  • Try different keywords");
        println!("  • Run 'citations scan' to index new content");
        if !keyword {
            println!("  • Run 'citations embed' to embed newly scanned chunks");
        }
        return Ok(());
    }

    println!();
    println!(
        "Found {} result{}",
        results.len().to_string().green(),
        if results.len() == 1 { "" } else { "s" }
    );
    println!();

    for result in &results {
        print_result(result);
    }

    Ok(())
}

fn semantic_search(
    db: &Database,
    config: &Config,
    collection: &str,
    query: &str,
    limit: usize,
) -> Result<Vec<SimilarityResult>> {
    let (embedded, _) = db.embedding_stats(collection)?;
    if embedded == 0 {
        anyhow::bail!(
            "No embeddings found. Run 'citations embed' first, or search with --keyword."
        );
    }

    let client =
        OllamaClient::from_config(&config.ollama).context("Failed to create Ollama client")?;
    let rt = Runtime::new().context("Failed to create async runtime")?;

    if !rt.block_on(client.is_available()) {
        anyhow::bail!(
            "Ollama is not running at {}. Start it with 'ollama serve'.",
            config.ollama.host
        );
    }

    let query_embedding = rt
        .block_on(client.embed(&config.ollama.embedding_model, query))
        .context("Failed to embed query")?;

    Ok(db.vector_search(collection, &query_embedding, limit, None)?)
}

fn print_result(result: &SimilarityResult) {
    let metadata = &result.chunk.chunk.metadata;
    let title = metadata
        .get("website")
        .or_else(|| result.chunk.source_path.as_ref())
        .map(String::as_str)
        .unwrap_or(result.chunk.chunk.id.as_str());

    println!(
        "{} {} {}",
        "•".cyan(),
        title.white().bold(),
        format!("[{}]", result.chunk.chunk.id).dimmed()
    );
    if let Some(domain) = metadata.get("domain") {
        println!("  {} {}", "Domain:".dimmed(), domain);
    }
    println!("  {} {:.0}%", "Score:".dimmed(), result.similarity * 100.0);
    println!("  {}", truncate(&result.chunk.chunk.text, 200).dimmed());
    println!();
}
