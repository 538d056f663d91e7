//! Drop command - remove a collection from the index.

use super::{ensure_collection, index_dir, load_config, open_database};
use anyhow::Result;
use citations_config::ConfigStore;
use citations_db::Database;
use colored::Colorize;

/// What dropping a collection did.
#[derive(Debug, PartialEq, Eq)]
pub struct Dropped {
    pub chunks: i64,
    /// The watermark was reset because the configured collection was dropped.
    pub watermark_reset: bool,
}

pub fn run(store: &ConfigStore, collection: &str) -> Result<()> {
    let config = load_config(store)?;
    let db = open_database(&index_dir(&config, None)?)?;

    let dropped = drop_collection(store, &db, collection)?;

    println!(
        "{} Dropped '{}' ({} chunks)",
        "✓".green(),
        collection,
        dropped.chunks
    );
    if dropped.watermark_reset {
        println!(
            "  Watermark reset; the next {} re-indexes every file.",
            "citations scan".cyan()
        );
    }
    Ok(())
}

/// Delete `collection` with its embeddings. Dropping the configured
/// collection also resets the watermark, since scans feed that collection.
pub fn drop_collection(store: &ConfigStore, db: &Database, collection: &str) -> Result<Dropped> {
    ensure_collection(db, collection)?;
    let chunks = db.delete_collection(collection)?;

    let watermark_reset = store.load()?.index.collection == collection;
    if watermark_reset {
        store.reset_watermark()?;
    }

    Ok(Dropped {
        chunks,
        watermark_reset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use citations_core::{epoch, Chunk, Metadata};

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        let chunks = [
            Chunk::new("a-0", "one", Metadata::new()),
            Chunk::new("a-1", "two", Metadata::new()),
        ];
        db.upsert_chunks("citations", None, &chunks).unwrap();
        db.upsert_chunks("scratch", None, &chunks[..1]).unwrap();
        db.store_embedding("citations", "a-0", &[1.0], "m").unwrap();
        db
    }

    fn store_with_watermark(dir: &std::path::Path) -> ConfigStore {
        let store = ConfigStore::new(dir.join("config.toml"));
        store
            .commit_watermark(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
            .unwrap();
        store
    }

    #[test]
    fn test_drop_configured_collection_resets_watermark() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_watermark(dir.path());
        let db = seeded();

        let dropped = drop_collection(&store, &db, "citations").unwrap();

        assert_eq!(
            dropped,
            Dropped {
                chunks: 2,
                watermark_reset: true
            }
        );
        assert_eq!(db.embedding_stats("citations").unwrap(), (0, 0));
        assert_eq!(db.count_chunks("scratch").unwrap(), 1);
        assert_eq!(store.load().unwrap().last_scan_time, epoch());
    }

    #[test]
    fn test_drop_side_collection_keeps_watermark() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_watermark(dir.path());
        let db = seeded();

        let dropped = drop_collection(&store, &db, "scratch").unwrap();

        assert!(!dropped.watermark_reset);
        assert_eq!(db.count_chunks("citations").unwrap(), 2);
        assert_ne!(store.load().unwrap().last_scan_time, epoch());
    }

    #[test]
    fn test_drop_unknown_collection_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_watermark(dir.path());
        assert!(drop_collection(&store, &seeded(), "nope").is_err());
    }
}
