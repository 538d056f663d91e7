//! Scanner for archived web page snapshots.
//!
//! Each snapshot directory holds the extracted page text and an `index.json`
//! sidecar describing the page. The sidecar is what changes when a snapshot is
//! updated, so its modification time gates the snapshot.

use super::{chunk_file, read_text, walk_files, Scanner, WatermarkFilter};
use crate::chunker::Chunker;
use crate::error::{IngestError, IngestResult};
use crate::sidecar::SnapshotSidecar;
use citations_core::{ChunkBatch, ScanTarget, SourceKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extracted page text inside a snapshot directory.
pub const SNAPSHOT_FILE_NAME: &str = "htmltotext.txt";

/// Snapshot metadata next to the extracted text.
pub const SIDECAR_FILE_NAME: &str = "index.json";

/// Scans a directory tree of archive snapshots.
pub struct ArchiveScanner {
    target: ScanTarget,
    filter: WatermarkFilter,
    chunker: Arc<Chunker>,
}

impl ArchiveScanner {
    pub fn new(target: ScanTarget, filter: WatermarkFilter, chunker: Arc<Chunker>) -> Self {
        Self {
            target,
            filter,
            chunker,
        }
    }

    fn sidecar_path(path: &Path) -> PathBuf {
        path.with_file_name(SIDECAR_FILE_NAME)
    }
}

impl Scanner for ArchiveScanner {
    fn kind(&self) -> SourceKind {
        SourceKind::Archive
    }

    fn root(&self) -> &Path {
        &self.target.directory
    }

    fn list_candidate_files(&self) -> Box<dyn Iterator<Item = PathBuf> + '_> {
        Box::new(
            walk_files(self.root())
                .filter(|p| p.file_name().and_then(|n| n.to_str()) == Some(SNAPSHOT_FILE_NAME)),
        )
    }

    fn is_changed(&self, path: &Path) -> IngestResult<bool> {
        let sidecar = Self::sidecar_path(path);
        if !sidecar.is_file() {
            return Err(IngestError::MissingSidecar {
                path: path.to_path_buf(),
                sidecar,
            });
        }
        self.filter.check(&sidecar)
    }

    fn load_batch(&self, path: &Path) -> IngestResult<Option<ChunkBatch>> {
        let sidecar_path = Self::sidecar_path(path);
        if !sidecar_path.is_file() {
            return Err(IngestError::MissingSidecar {
                path: path.to_path_buf(),
                sidecar: sidecar_path,
            });
        }
        let sidecar = SnapshotSidecar::load(&sidecar_path)?;
        let text = read_text(path)?;

        // Target metadata first so provenance keys win
        let mut metadata = self.target.static_metadata();
        metadata.insert("website".to_string(), sidecar.base_url.clone());
        let domain = self.target.domain.clone().unwrap_or(sidecar.domain);
        metadata.insert("domain".to_string(), domain);

        chunk_file(&self.chunker, path, &text, &sidecar.hash, &metadata)
    }
}
