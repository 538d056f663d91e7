//! Citations Ingest - Incremental scanning and chunking pipeline.
//!
//! This crate provides:
//! - Token counting under a fixed tokenization scheme
//! - Boundary-aware chunking within a token budget
//! - Scanners for archive snapshots and Markdown notes, gated by a watermark
//! - The orchestrator that drives scanners and upserts each file's chunks

mod chunker;
mod error;
mod index;
mod markdown;
mod orchestrator;
mod scanner;
mod sidecar;
mod tokenizer;

pub use chunker::{ChunkConfig, ChunkError, ChunkSpan, Chunker};
pub use error::{IngestError, IngestResult};
pub use index::{ChunkIndex, IndexHandle};
pub use markdown::to_plain_text;
pub use orchestrator::{ScanEvent, ScanOrchestrator, ScanReport, TargetSummary};
pub use scanner::{
    build_scanner, modified_time, ArchiveScanner, FileFailure, MarkdownScanner, ScanRun, Scanner,
    WatermarkFilter, SIDECAR_FILE_NAME, SNAPSHOT_FILE_NAME,
};
pub use sidecar::SnapshotSidecar;
pub use tokenizer::{Cl100kCounter, TokenCounter};
