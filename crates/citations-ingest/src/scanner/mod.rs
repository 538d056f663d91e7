//! Scanners turn a target directory into per-file chunk batches.
//!
//! Every scanner follows the same contract: enumerate candidate files, keep
//! the ones changed after the watermark, then load, chunk, and label each one.
//! [`ScanRun`] drives that contract lazily, one file at a time.

mod archive;
mod filter;
mod markdown;

pub use archive::{ArchiveScanner, SIDECAR_FILE_NAME, SNAPSHOT_FILE_NAME};
pub use filter::{modified_time, WatermarkFilter};
pub use markdown::MarkdownScanner;

use crate::chunker::Chunker;
use crate::error::{IngestError, IngestResult};
use chrono::{DateTime, Utc};
use citations_core::{Chunk, ChunkBatch, Metadata, ScanTarget, SourceKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// A file that could not be turned into a batch.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: IngestError,
}

impl FileFailure {
    pub fn new(path: impl Into<PathBuf>, error: IngestError) -> Self {
        Self {
            path: path.into(),
            error,
        }
    }
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// Produces chunk batches for one scan target.
pub trait Scanner {
    /// Source format handled by this scanner.
    fn kind(&self) -> SourceKind;

    /// The directory being scanned.
    fn root(&self) -> &Path;

    /// Candidate files under the root, in file-system enumeration order.
    fn list_candidate_files(&self) -> Box<dyn Iterator<Item = PathBuf> + '_>;

    /// Whether the candidate changed after the watermark.
    fn is_changed(&self, path: &Path) -> IngestResult<bool>;

    /// Load, chunk, and label one candidate. `None` when it has no text.
    fn load_batch(&self, path: &Path) -> IngestResult<Option<ChunkBatch>>;

    /// Lazily scan the root.
    fn run(&self) -> ScanRun<'_>
    where
        Self: Sized,
    {
        ScanRun::new(self)
    }
}

/// Build the scanner for a target.
pub fn build_scanner(
    target: &ScanTarget,
    watermark: DateTime<Utc>,
    chunker: Arc<Chunker>,
) -> Box<dyn Scanner> {
    let filter = WatermarkFilter::new(watermark);
    match target.kind {
        SourceKind::Archive => Box::new(ArchiveScanner::new(target.clone(), filter, chunker)),
        SourceKind::Markdown => Box::new(MarkdownScanner::new(target.clone(), filter, chunker)),
    }
}

/// A single pass over a scanner's candidates.
///
/// Yields one item per changed file: its batch, or why it failed. Unchanged
/// files and files without text yield nothing.
pub struct ScanRun<'a> {
    scanner: &'a dyn Scanner,
    candidates: Box<dyn Iterator<Item = PathBuf> + 'a>,
    unchanged: usize,
    empty: usize,
}

impl<'a> ScanRun<'a> {
    pub fn new(scanner: &'a dyn Scanner) -> Self {
        Self {
            scanner,
            candidates: scanner.list_candidate_files(),
            unchanged: 0,
            empty: 0,
        }
    }

    /// Candidates skipped so far because they did not change.
    pub fn unchanged(&self) -> usize {
        self.unchanged
    }

    /// Changed candidates skipped so far because they had no text.
    pub fn empty(&self) -> usize {
        self.empty
    }
}

impl Iterator for ScanRun<'_> {
    type Item = Result<ChunkBatch, FileFailure>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let path = self.candidates.next()?;

            match self.scanner.is_changed(&path) {
                Ok(true) => {}
                Ok(false) => {
                    self.unchanged += 1;
                    continue;
                }
                Err(e) => return Some(Err(FileFailure::new(path, e))),
            }

            match self.scanner.load_batch(&path) {
                Ok(Some(batch)) => return Some(Ok(batch)),
                Ok(None) => {
                    debug!("No text in {}", path.display());
                    self.empty += 1;
                }
                Err(e) => return Some(Err(FileFailure::new(path, e))),
            }
        }
    }
}

/// Regular files under `root`, skipping hidden files and directories.
pub(crate) fn walk_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(DirEntry::into_path)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// Read a file as text, replacing invalid UTF-8.
pub(crate) fn read_text(path: &Path) -> IngestResult<String> {
    let bytes = std::fs::read(path).map_err(|e| IngestError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Chunk `text` and label every chunk `{stem}-{ordinal}` with `metadata`.
pub(crate) fn chunk_file(
    chunker: &Chunker,
    path: &Path,
    text: &str,
    stem: &str,
    metadata: &Metadata,
) -> IngestResult<Option<ChunkBatch>> {
    let texts = chunker.chunk(text).map_err(|e| IngestError::Chunking {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if texts.is_empty() {
        return Ok(None);
    }

    let chunks = texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| Chunk::new(format!("{}-{}", stem, i), text, metadata.clone()))
        .collect();

    Ok(Some(ChunkBatch::new(path, chunks)))
}
