//! Chunk upsert and lookup operations.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use chrono::{DateTime, Utc};
use citations_core::{Chunk, Metadata};
use rusqlite::types::Type;
use rusqlite::{params, Row};

/// A chunk as stored in a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedChunk {
    pub collection: String,
    pub chunk: Chunk,
    pub source_path: Option<String>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) const CHUNK_COLUMNS: &str = "collection, id, document, metadata, source_path, updated_at";

/// Map a row selected with [`CHUNK_COLUMNS`] (in that order, starting at `offset`).
///
/// Unreadable metadata or timestamps fail the row rather than being replaced.
pub(crate) fn indexed_chunk_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<IndexedChunk> {
    let metadata_str: String = row.get(offset + 3)?;
    let updated_at_str: String = row.get(offset + 5)?;
    let metadata: Metadata = serde_json::from_str(&metadata_str)
        .map_err(|e| corrupt_column(offset + 3, Box::new(e)))?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
        .map_err(|e| corrupt_column(offset + 5, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(IndexedChunk {
        collection: row.get(offset)?,
        chunk: Chunk {
            id: row.get(offset + 1)?,
            text: row.get(offset + 2)?,
            metadata,
        },
        source_path: row.get(offset + 4)?,
        updated_at,
    })
}

fn corrupt_column(
    index: usize,
    error: Box<dyn std::error::Error + Send + Sync + 'static>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, error)
}

impl Database {
    /// Insert or overwrite chunks by id in a single transaction.
    ///
    /// Rows whose document and metadata are unchanged are left untouched, so
    /// repeating an upsert is a no-op. A changed document drops its stale
    /// embedding. Returns the number of rows inserted or changed.
    pub fn upsert_chunks(
        &self,
        collection: &str,
        source_path: Option<&str>,
        chunks: &[Chunk],
    ) -> DbResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        let mut changed = 0;

        {
            let mut drop_stale = tx.prepare(
                r#"
                DELETE FROM embeddings
                WHERE collection = ?1 AND chunk_id = ?2
                  AND EXISTS (
                      SELECT 1 FROM chunks
                      WHERE collection = ?1 AND id = ?2 AND document IS NOT ?3
                  )
                "#,
            )?;

            let mut upsert = tx.prepare(
                r#"
                INSERT INTO chunks (collection, id, document, metadata, source_path, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(collection, id) DO UPDATE SET
                    document = excluded.document,
                    metadata = excluded.metadata,
                    source_path = excluded.source_path,
                    updated_at = excluded.updated_at
                WHERE chunks.document IS NOT excluded.document
                   OR chunks.metadata IS NOT excluded.metadata
                   OR chunks.source_path IS NOT excluded.source_path
                "#,
            )?;

            for chunk in chunks {
                let metadata = serde_json::to_string(&chunk.metadata)?;
                drop_stale.execute(params![collection, chunk.id, chunk.text])?;
                changed += upsert.execute(params![
                    collection,
                    chunk.id,
                    chunk.text,
                    metadata,
                    source_path,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(changed)
    }

    /// Get a chunk by id.
    pub fn get_chunk(&self, collection: &str, id: &str) -> DbResult<IndexedChunk> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM chunks WHERE collection = ?1 AND id = ?2",
            CHUNK_COLUMNS
        );
        conn.query_row(&sql, params![collection, id], |row| {
            indexed_chunk_from_row(row, 0)
        })
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                DbError::NotFound(format!("Chunk not found: {}/{}", collection, id))
            }
            _ => DbError::from(e),
        })
    }

    /// Get all chunks recorded for a source file, ordered by id.
    pub fn get_chunks_by_source(
        &self,
        collection: &str,
        source_path: &str,
    ) -> DbResult<Vec<IndexedChunk>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM chunks WHERE collection = ?1 AND source_path = ?2 ORDER BY id",
            CHUNK_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let chunks = stmt.query_map(params![collection, source_path], |row| {
            indexed_chunk_from_row(row, 0)
        })?;

        chunks.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Count chunks in a collection.
    pub fn count_chunks(&self, collection: &str) -> DbResult<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a whole collection, returning the number of chunks removed.
    pub fn delete_collection(&self, collection: &str) -> DbResult<i64> {
        let conn = self.conn()?;
        let count = conn.execute("DELETE FROM chunks WHERE collection = ?1", params![collection])?;
        Ok(count as i64)
    }
}
