//! CLI command implementations.

pub mod config;
pub mod drop;
pub mod embed;
pub mod init;
pub mod scan;
pub mod search;
pub mod stats;

use anyhow::{Context, Result};
use citations_config::{expand_path, AppPaths, Config, ConfigStore};
use citations_db::Database;
use std::path::{Path, PathBuf};

/// Get the application paths.
pub fn get_paths() -> Result<AppPaths> {
    AppPaths::new().context("Failed to determine application directories")
}

/// The config store at `path`, or at the platform default location.
pub fn config_store(path: Option<&Path>) -> Result<ConfigStore> {
    match path {
        Some(path) => Ok(ConfigStore::new(expand_path(path))),
        None => ConfigStore::default_location().context("Failed to determine config location"),
    }
}

/// Load the configuration, falling back to defaults when the file is absent.
pub fn load_config(store: &ConfigStore) -> Result<Config> {
    store
        .load()
        .with_context(|| format!("Failed to load config from {}", store.path().display()))
}

/// Directory holding the index, honouring an override.
pub fn index_dir(config: &Config, data_path: Option<&str>) -> Result<PathBuf> {
    match data_path {
        Some(path) => Ok(expand_path(Path::new(path))),
        None => Ok(config.index.data_dir(&get_paths()?)),
    }
}

/// Open the index in `dir`, creating it if needed.
pub fn open_database(dir: &Path) -> Result<Database> {
    Database::open_index(dir)
        .with_context(|| format!("Failed to open index in {}", dir.display()))
}

/// Fail unless `collection` holds chunks, naming the ones that do.
pub fn ensure_collection(db: &Database, collection: &str) -> Result<()> {
    let known = db.list_collections()?;
    if known.iter().any(|c| c == collection) {
        return Ok(());
    }
    if known.is_empty() {
        anyhow::bail!("The index is empty. Run 'citations scan' first.");
    }
    anyhow::bail!(
        "Collection '{}' has no chunks. Known collections: {}",
        collection,
        known.join(", ")
    )
}

/// Format a file size in human-readable form.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Shorten text to `max_chars` characters on one line.
pub fn truncate(s: &str, max_chars: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let truncated: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short\n\ntext", 20), "short text");
        assert_eq!(truncate("日本語のテキストです", 6), "日本語...");
    }

    #[test]
    fn test_open_database_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("nested").join("data");
        let db = open_database(&index).unwrap();
        db.verify().unwrap();
        assert_eq!(db.file(), Some(Database::index_file(&index).as_path()));
    }

    #[test]
    fn test_ensure_collection() {
        use citations_core::{Chunk, Metadata};

        let db = Database::open_in_memory().unwrap();
        let err = ensure_collection(&db, "citations").unwrap_err();
        assert!(err.to_string().contains("index is empty"));

        db.upsert_chunks("notes", None, &[Chunk::new("a.md-0", "x", Metadata::new())])
            .unwrap();
        ensure_collection(&db, "notes").unwrap();
        let err = ensure_collection(&db, "citations").unwrap_err();
        assert!(err.to_string().contains("Known collections: notes"));
    }

    #[test]
    fn test_data_path_override() {
        let config = Config::default();
        let dir = index_dir(&config, Some("/tmp/citations-index")).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/citations-index"));
    }
}
