//! The vector index seen from the scanning pipeline.

use crate::error::{IngestError, IngestResult};
use citations_core::ChunkBatch;
use citations_db::Database;
use tracing::debug;

/// A store that accepts chunk batches keyed by chunk id.
///
/// Upserting the same batch twice must leave the index as if it were
/// upserted once.
pub trait ChunkIndex {
    fn upsert(&self, batch: &ChunkBatch) -> IngestResult<()>;
}

/// One collection in the local index database.
pub struct IndexHandle {
    db: Database,
    collection: String,
}

impl IndexHandle {
    pub fn new(db: Database, collection: impl Into<String>) -> Self {
        Self {
            db,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl ChunkIndex for IndexHandle {
    fn upsert(&self, batch: &ChunkBatch) -> IngestResult<()> {
        let source = batch.source_path().to_string_lossy().into_owned();
        let changed = self
            .db
            .upsert_chunks(&self.collection, Some(source.as_str()), &batch.chunks)
            .map_err(|e| IngestError::IndexUpsert {
                path: batch.source_path().to_path_buf(),
                message: e.to_string(),
            })?;

        debug!(
            "Upserted {} chunks from {} ({} changed)",
            batch.len(),
            source,
            changed
        );
        Ok(())
    }
}
