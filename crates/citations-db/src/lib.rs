//! Citations DB - The persistent vector index, backed by SQLite.
//!
//! Chunks live in named collections and are keyed by `(collection, id)`.
//! Writing a chunk whose id already exists overwrites it, so re-indexing the
//! same content never duplicates it.

mod database;
mod error;
mod migrations;
mod operations;

pub use database::{Database, INDEX_FILE_NAME};
pub use error::{DbError, DbResult};
pub use operations::chunks::IndexedChunk;
pub use operations::stats::{CollectionStats, IndexStats};
pub use operations::vectors::{cosine_similarity, SimilarityResult};
