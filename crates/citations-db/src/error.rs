//! Index error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Index I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Chunk metadata could not be encoded as JSON.
    #[error("Metadata serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The index was written by a newer schema.
    #[error("Migration error: {0}")]
    Migration(String),

    /// The integrity check found damage.
    #[error("Index is corrupt: {0}")]
    Corrupt(String),
}

pub type DbResult<T> = Result<T, DbError>;
