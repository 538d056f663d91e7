//! Embed command - generate embeddings for chunks.

use super::{index_dir, load_config, open_database};
use anyhow::{Context, Result};
use citations_config::ConfigStore;
use citations_db::Database;
use citations_ollama::OllamaClient;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::runtime::Runtime;
use tracing::debug;

/// Run the embed command.
pub fn run(store: &ConfigStore, batch_size: usize, collection: Option<String>) -> Result<()> {
    let config = load_config(store)?;
    let collection = collection.unwrap_or_else(|| config.index.collection.clone());
    let model = config.ollama.embedding_model.clone();
    let db = open_database(&index_dir(&config, None)?)?;

    let (embedded, total) = db.embedding_stats(&collection)?;
    if total == 0 {
        println!(
            "{} Collection '{}' is empty. Run {} first.",
            "Note:".yellow(),
            collection,
            "citations scan".cyan()
        );
        return Ok(());
    }
    if embedded == total {
        println!("{} All {} chunks have embeddings!", "✓".green(), total);
        return Ok(());
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

    let has_model = rt.block_on(client.has_model(&model)).unwrap_or(false);
    if !has_model {
        anyhow::bail!(
            "Model '{}' is not available. Run 'ollama pull {}' first.",
            model,
            model
        );
    }

    let remaining = (total - embedded) as u64;
    let pb = ProgressBar::new(remaining);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("█▓░"),
    );

    let done = embed_pending(&db, &client, &rt, &collection, &model, batch_size.max(1), &pb)?;
    pb.finish_and_clear();

    println!(
        "{} Embedded {} chunk(s) in '{}' with {}",
        "✓".green(),
        done.to_string().green(),
        collection,
        model.cyan()
    );

    Ok(())
}

/// Embed unembedded chunks round by round until none are left.
fn embed_pending(
    db: &Database,
    client: &OllamaClient,
    rt: &Runtime,
    collection: &str,
    model: &str,
    batch_size: usize,
    pb: &ProgressBar,
) -> Result<usize> {
    let mut done = 0;

    loop {
        let pending = db.get_unembedded_chunks(collection, batch_size)?;
        if pending.is_empty() {
            break;
        }

        let texts: Vec<String> = pending.iter().map(|c| c.chunk.text.clone()).collect();
        let vectors = rt
            .block_on(client.embed_batch(model, &texts))
            .with_context(|| format!("Failed to embed chunks starting at {}", pending[0].chunk.id))?;

        for (indexed, vector) in pending.iter().zip(&vectors) {
            db.store_embedding(collection, &indexed.chunk.id, vector, model)?;
            done += 1;
            pb.inc(1);
        }
        debug!("Embedded {} chunk(s) in '{}'", pending.len(), collection);
    }

    Ok(done)
}
