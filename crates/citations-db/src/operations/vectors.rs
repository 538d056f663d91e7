//! Embedding storage and similarity search.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::operations::chunks::{indexed_chunk_from_row, IndexedChunk, CHUNK_COLUMNS};
use rusqlite::params;

/// Result of a similarity search.
#[derive(Debug, Clone)]
pub struct SimilarityResult {
    /// The matching chunk.
    pub chunk: IndexedChunk,
    /// Relevance score, higher is better.
    pub similarity: f32,
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot_product = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    dot_product / denominator
}

fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_vector(bytes: &[u8], dimensions: usize) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .take(dimensions)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

impl Database {
    /// Store the embedding for a chunk, replacing any previous one.
    pub fn store_embedding(
        &self,
        collection: &str,
        chunk_id: &str,
        vector: &[f32],
        model: &str,
    ) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO embeddings (collection, chunk_id, vector, model, dimensions)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                collection,
                chunk_id,
                vector_to_bytes(vector),
                model,
                vector.len() as i32
            ],
        )?;
        Ok(())
    }

    /// Get the embedding for a chunk, if one has been stored.
    pub fn get_embedding(&self, collection: &str, chunk_id: &str) -> DbResult<Option<Vec<f32>>> {
        let conn = self.conn()?;

        let result = conn.query_row(
            "SELECT vector, dimensions FROM embeddings WHERE collection = ?1 AND chunk_id = ?2",
            params![collection, chunk_id],
            |row| {
                let bytes: Vec<u8> = row.get(0)?;
                let dimensions: i32 = row.get(1)?;
                Ok((bytes, dimensions))
            },
        );

        match result {
            Ok((bytes, dimensions)) => Ok(Some(bytes_to_vector(&bytes, dimensions as usize))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DbError::from(e)),
        }
    }

    /// Get chunks that don't have embeddings yet.
    pub fn get_unembedded_chunks(&self, collection: &str, limit: usize) -> DbResult<Vec<IndexedChunk>> {
        let conn = self.conn()?;
        let columns = CHUNK_COLUMNS
            .split(", ")
            .map(|c| format!("c.{}", c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            r#"
            SELECT {}
            FROM chunks c
            LEFT JOIN embeddings e ON e.collection = c.collection AND e.chunk_id = c.id
            WHERE c.collection = ?1 AND e.chunk_id IS NULL
            ORDER BY c.id
            LIMIT ?2
            "#,
            columns
        );

        let mut stmt = conn.prepare(&sql)?;
        let chunks = stmt.query_map(params![collection, limit as i64], |row| {
            indexed_chunk_from_row(row, 0)
        })?;

        chunks.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Get embedding statistics: (embedded_count, total_count).
    pub fn embedding_stats(&self, collection: &str) -> DbResult<(i64, i64)> {
        let conn = self.conn()?;

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;

        let embedded: i64 = conn.query_row(
            "SELECT COUNT(*) FROM embeddings WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;

        Ok((embedded, total))
    }

    /// Find similar chunks using cosine similarity.
    ///
    /// Brute force over every embedding in the collection, which is fine for
    /// personal archives.
    pub fn vector_search(
        &self,
        collection: &str,
        query_vector: &[f32],
        limit: usize,
        min_similarity: Option<f32>,
    ) -> DbResult<Vec<SimilarityResult>> {
        let conn = self.conn()?;
        let min_sim = min_similarity.unwrap_or(0.0);

        let mut stmt = conn.prepare(
            r#"
            SELECT c.collection, c.id, c.document, c.metadata, c.source_path, c.updated_at,
                   e.vector, e.dimensions
            FROM embeddings e
            JOIN chunks c ON c.collection = e.collection AND c.id = e.chunk_id
            WHERE e.collection = ?1
            "#,
        )?;

        let rows = stmt.query_map(params![collection], |row| {
            let chunk = indexed_chunk_from_row(row, 0)?;
            let vector_bytes: Vec<u8> = row.get(6)?;
            let dimensions: i32 = row.get(7)?;
            Ok((chunk, vector_bytes, dimensions))
        })?;

        let mut results: Vec<SimilarityResult> = Vec::new();
        for row_result in rows {
            let (chunk, vector_bytes, dimensions) = row_result?;
            let vector = bytes_to_vector(&vector_bytes, dimensions as usize);
            let similarity = cosine_similarity(query_vector, &vector);

            if similarity >= min_sim {
                results.push(SimilarityResult { chunk, similarity });
            }
        }

        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(limit);

        Ok(results)
    }

    /// Full-text search over chunk documents, best matches first.
    pub fn keyword_search(
        &self,
        collection: &str,
        query: &str,
        limit: usize,
    ) -> DbResult<Vec<SimilarityResult>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT c.collection, c.id, c.document, c.metadata, c.source_path, c.updated_at,
                   bm25(chunks_fts)
            FROM chunks_fts
            JOIN chunks c ON c.rowid = chunks_fts.rowid
            WHERE chunks_fts MATCH ?1 AND c.collection = ?2
            ORDER BY bm25(chunks_fts)
            LIMIT ?3
            "#,
        )?;

        let rows = stmt.query_map(params![query, collection, limit as i64], |row| {
            let chunk = indexed_chunk_from_row(row, 0)?;
            let bm25_score: f64 = row.get(6)?;
            // BM25 scores are negative, normalize to 0-1 range
            let similarity = 1.0 / (1.0 + (bm25_score as f32).exp());
            Ok(SimilarityResult { chunk, similarity })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}
