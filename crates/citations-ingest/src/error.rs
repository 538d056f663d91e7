//! Error types for the scanning pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for scanning operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that can occur while scanning and indexing.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] citations_config::ConfigError),

    #[error("Scan target directory does not exist: {0}")]
    TargetMissing(PathBuf),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing sidecar for {path}: expected {sidecar}")]
    MissingSidecar { path: PathBuf, sidecar: PathBuf },

    #[error("Malformed sidecar {path}: {message}")]
    MalformedSidecar { path: PathBuf, message: String },

    #[error("Chunking failed for {path}: {message}")]
    Chunking { path: PathBuf, message: String },

    #[error("Index rejected batch for {path}: {message}")]
    IndexUpsert { path: PathBuf, message: String },
}

impl IngestError {
    /// Whether the failure concerns one file only and the run can go on.
    pub fn is_file_level(&self) -> bool {
        matches!(
            self,
            IngestError::Read { .. }
                | IngestError::MissingSidecar { .. }
                | IngestError::MalformedSidecar { .. }
                | IngestError::Chunking { .. }
                | IngestError::IndexUpsert { .. }
        )
    }
}
