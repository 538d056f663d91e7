//! The index database: one SQLite file inside an index directory.

use crate::error::{DbError, DbResult};
use crate::migrations;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub type ConnectionPool = Pool<SqliteConnectionManager>;
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Name of the database file inside an index directory.
pub const INDEX_FILE_NAME: &str = "citations.db";

/// Handle to the index. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct Database {
    pool: ConnectionPool,
    /// Backing file, `None` for in-memory indexes.
    file: Option<PathBuf>,
}

impl Database {
    /// Path of the database file for the index in `dir`.
    pub fn index_file(dir: &Path) -> PathBuf {
        dir.join(INDEX_FILE_NAME)
    }

    /// Open the index stored in `dir`, creating the directory and an empty
    /// index on first use.
    pub fn open_index(dir: &Path) -> DbResult<Self> {
        std::fs::create_dir_all(dir)?;
        Self::open(Self::index_file(dir))
    }

    /// Open an index file directly.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening index at: {}", path.display());

        // Scans write one transaction per file while embed/search read, so WAL.
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;",
            )
        });
        let pool = Pool::builder().max_size(4).build(manager)?;
        migrations::initialize_schema(&*pool.get()?)?;

        Ok(Self {
            pool,
            file: Some(path.to_path_buf()),
        })
    }

    /// Open a throwaway in-memory index.
    pub fn open_in_memory() -> DbResult<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        // Every in-memory connection is its own database
        let pool = Pool::builder().max_size(1).build(manager)?;
        migrations::initialize_schema(&*pool.get()?)?;

        Ok(Self { pool, file: None })
    }

    pub fn conn(&self) -> DbResult<PooledConn> {
        Ok(self.pool.get()?)
    }

    /// Backing file, if any.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Size of the backing file in bytes; 0 for in-memory indexes.
    pub fn file_size(&self) -> DbResult<u64> {
        match &self.file {
            Some(path) => Ok(std::fs::metadata(path)?.len()),
            None => Ok(0),
        }
    }

    /// Run SQLite's integrity check, failing with [`DbError::Corrupt`] on the
    /// first problem it reports.
    pub fn verify(&self) -> DbResult<()> {
        let conn = self.conn()?;
        let result: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if result == "ok" {
            Ok(())
        } else {
            warn!("Index integrity check failed: {}", result);
            Err(DbError::Corrupt(result))
        }
    }
}
