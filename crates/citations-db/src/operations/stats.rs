//! Index statistics.

use crate::database::Database;
use crate::error::{DbError, DbResult};

/// Counts for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStats {
    pub name: String,
    pub chunks: i64,
    pub embedded: i64,
    pub sources: i64,
}

/// Counts across the whole index.
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub total_chunks: i64,
    pub total_embeddings: i64,
    pub collections: Vec<CollectionStats>,
}

impl Database {
    /// Names of all collections holding at least one chunk.
    pub fn list_collections(&self) -> DbResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT DISTINCT collection FROM chunks ORDER BY collection")?;
        let names = stmt.query_map([], |row| row.get(0))?;
        names.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Get per-collection and total statistics.
    pub fn get_stats(&self) -> DbResult<IndexStats> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT c.collection,
                   COUNT(*),
                   COUNT(e.chunk_id),
                   COUNT(DISTINCT c.source_path)
            FROM chunks c
            LEFT JOIN embeddings e ON e.collection = c.collection AND e.chunk_id = c.id
            GROUP BY c.collection
            ORDER BY c.collection
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(CollectionStats {
                name: row.get(0)?,
                chunks: row.get(1)?,
                embedded: row.get(2)?,
                sources: row.get(3)?,
            })
        })?;

        let mut stats = IndexStats::default();
        for row in rows {
            let collection = row?;
            stats.total_chunks += collection.chunks;
            stats.total_embeddings += collection.embedded;
            stats.collections.push(collection);
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citations_core::{Chunk, Metadata};

    #[test]
    fn test_empty_stats() {
        let db = Database::open_in_memory().unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.total_chunks, 0);
        assert!(stats.collections.is_empty());
    }

    #[test]
    fn test_stats_per_collection() {
        let db = Database::open_in_memory().unwrap();
        let chunks = vec![
            Chunk::new("x-0", "one", Metadata::new()),
            Chunk::new("x-1", "two", Metadata::new()),
        ];
        db.upsert_chunks("notes", Some("/n/a.md"), &chunks).unwrap();
        db.upsert_chunks("web", Some("/w/1/htmltotext.txt"), &chunks[..1]).unwrap();
        db.store_embedding("notes", "x-0", &[1.0], "m").unwrap();

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.total_chunks, 3);
        assert_eq!(stats.total_embeddings, 1);
        assert_eq!(
            stats.collections[0],
            CollectionStats {
                name: "notes".to_string(),
                chunks: 2,
                embedded: 1,
                sources: 1,
            }
        );
        assert_eq!(stats.collections[1].name, "web");
        assert_eq!(db.list_collections().unwrap(), vec!["notes", "web"]);
    }
}
