//! Drives scanners over every target and feeds batches to the index.

use crate::chunker::Chunker;
use crate::error::{IngestError, IngestResult};
use crate::index::ChunkIndex;
use crate::scanner::{build_scanner, FileFailure, ScanRun, Scanner};
use chrono::{DateTime, Utc};
use citations_config::ConfigStore;
use citations_core::{ScanTarget, SourceKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Progress notifications emitted while scanning.
#[derive(Debug, Clone, Copy)]
pub enum ScanEvent<'e> {
    TargetStarted(&'e ScanTarget),
    Indexed { path: &'e Path, chunks: usize },
    /// A file that would be indexed; dry runs only.
    Pending(&'e Path),
    Failed(&'e FileFailure),
}

/// Per-target counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSummary {
    pub kind: SourceKind,
    pub directory: PathBuf,
    pub batches: usize,
    pub chunks: usize,
    pub failed: usize,
    pub unchanged: usize,
    pub empty: usize,
}

impl TargetSummary {
    fn new(target: &ScanTarget) -> Self {
        Self {
            kind: target.kind,
            directory: target.directory.clone(),
            batches: 0,
            chunks: 0,
            failed: 0,
            unchanged: 0,
            empty: 0,
        }
    }
}

/// Outcome of one orchestrator run.
#[derive(Debug)]
pub struct ScanReport {
    /// Captured before any file was examined; the next watermark.
    pub started_at: DateTime<Utc>,
    /// The watermark files were compared against.
    pub watermark: DateTime<Utc>,
    pub dry_run: bool,
    pub interrupted: bool,
    pub targets: Vec<TargetSummary>,
    pub failures: Vec<FileFailure>,
    /// Files that would be indexed, filled by dry runs.
    pub pending: Vec<PathBuf>,
}

impl ScanReport {
    fn new(started_at: DateTime<Utc>, watermark: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            started_at,
            watermark,
            dry_run,
            interrupted: false,
            targets: Vec::new(),
            failures: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Batches upserted across all targets.
    pub fn batches(&self) -> usize {
        self.targets.iter().map(|t| t.batches).sum()
    }

    /// Chunks upserted across all targets.
    pub fn chunks(&self) -> usize {
        self.targets.iter().map(|t| t.chunks).sum()
    }

    /// Every target was scanned to the end. Per-file failures don't count.
    pub fn completed(&self) -> bool {
        !self.interrupted
    }

    /// The watermark to persist, if this run earned one.
    pub fn next_watermark(&self) -> Option<DateTime<Utc>> {
        if self.completed() && !self.dry_run {
            Some(self.started_at)
        } else {
            None
        }
    }
}

/// Scans targets in order, one file at a time, upserting each file's batch.
pub struct ScanOrchestrator<'a> {
    index: &'a dyn ChunkIndex,
    chunker: Arc<Chunker>,
    interrupt: Option<Arc<AtomicBool>>,
    observer: Option<&'a dyn Fn(ScanEvent<'_>)>,
    dry_run: bool,
}

impl<'a> ScanOrchestrator<'a> {
    pub fn new(index: &'a dyn ChunkIndex, chunker: Arc<Chunker>) -> Self {
        Self {
            index,
            chunker,
            interrupt: None,
            observer: None,
            dry_run: false,
        }
    }

    /// Stop taking new files once `flag` is set. The file in flight finishes.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn Fn(ScanEvent<'_>)) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Only report which files qualify; nothing is read or upserted.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Scan `targets` for files changed after `watermark`.
    pub fn run(&self, targets: &[ScanTarget], watermark: DateTime<Utc>) -> IngestResult<ScanReport> {
        self.run_at(targets, watermark, Utc::now())
    }

    /// Like [`run`](Self::run) with an explicit start time.
    pub fn run_at(
        &self,
        targets: &[ScanTarget],
        watermark: DateTime<Utc>,
        started_at: DateTime<Utc>,
    ) -> IngestResult<ScanReport> {
        for target in targets {
            if !target.directory.is_dir() {
                return Err(IngestError::TargetMissing(target.directory.clone()));
            }
        }

        info!(
            "Scanning {} target(s) for changes after {}",
            targets.len(),
            watermark.to_rfc3339()
        );

        let mut report = ScanReport::new(started_at, watermark, self.dry_run);

        for target in targets {
            self.notify(ScanEvent::TargetStarted(target));
            let scanner = build_scanner(target, watermark, self.chunker.clone());

            let finished = if self.dry_run {
                self.preview_target(scanner.as_ref(), target, &mut report)
            } else {
                self.scan_target(scanner.as_ref(), target, &mut report)?
            };

            if !finished {
                report.interrupted = true;
                warn!("Scan interrupted, no further files will be read");
                break;
            }
        }

        info!(
            "Scan finished: {} batches, {} chunks, {} failures",
            report.batches(),
            report.chunks(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Load the persisted config, scan its targets, and advance the watermark
    /// when the run completed.
    pub fn run_and_commit(&self, store: &ConfigStore) -> IngestResult<ScanReport> {
        let config = store.load()?;
        let report = self.run(&config.resolved_targets(), config.last_scan_time)?;

        match report.next_watermark() {
            Some(next) => {
                store.commit_watermark(next)?;
            }
            None if report.interrupted => {
                warn!(
                    "Watermark left at {} because the scan did not finish",
                    config.last_scan_time.to_rfc3339()
                );
            }
            None => {}
        }

        Ok(report)
    }

    /// Returns false when interrupted.
    fn scan_target(
        &self,
        scanner: &dyn Scanner,
        target: &ScanTarget,
        report: &mut ScanReport,
    ) -> IngestResult<bool> {
        let mut summary = TargetSummary::new(target);
        let mut run = ScanRun::new(scanner);
        let mut finished = true;

        loop {
            if self.is_interrupted() {
                finished = false;
                break;
            }

            let Some(item) = run.next() else {
                break;
            };

            let result = item.and_then(|batch| match self.index.upsert(&batch) {
                Ok(()) => Ok(batch),
                Err(e) => Err(FileFailure::new(batch.source_path, e)),
            });

            match result {
                Ok(batch) => {
                    summary.batches += 1;
                    summary.chunks += batch.len();
                    debug!("Indexed {} ({} chunks)", batch.source_path.display(), batch.len());
                    self.notify(ScanEvent::Indexed {
                        path: &batch.source_path,
                        chunks: batch.len(),
                    });
                }
                Err(failure) if failure.error.is_file_level() => {
                    summary.failed += 1;
                    self.record_failure(report, failure);
                }
                Err(failure) => return Err(failure.error),
            }
        }

        summary.unchanged = run.unchanged();
        summary.empty = run.empty();
        info!(
            "{} target {}: {} batches, {} unchanged, {} failed",
            summary.kind,
            summary.directory.display(),
            summary.batches,
            summary.unchanged,
            summary.failed
        );
        report.targets.push(summary);
        Ok(finished)
    }

    /// Collect qualifying files without reading them. Returns false when interrupted.
    fn preview_target(&self, scanner: &dyn Scanner, target: &ScanTarget, report: &mut ScanReport) -> bool {
        let mut summary = TargetSummary::new(target);
        let mut finished = true;

        for path in scanner.list_candidate_files() {
            if self.is_interrupted() {
                finished = false;
                break;
            }

            match scanner.is_changed(&path) {
                Ok(true) => {
                    self.notify(ScanEvent::Pending(&path));
                    report.pending.push(path);
                }
                Ok(false) => summary.unchanged += 1,
                Err(e) => {
                    summary.failed += 1;
                    self.record_failure(report, FileFailure::new(path, e));
                }
            }
        }

        report.targets.push(summary);
        finished
    }

    fn record_failure(&self, report: &mut ScanReport, failure: FileFailure) {
        warn!("Skipping {}", failure);
        self.notify(ScanEvent::Failed(&failure));
        report.failures.push(failure);
    }

    fn is_interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    fn notify(&self, event: ScanEvent<'_>) {
        if let Some(observer) = self.observer {
            observer(event);
        }
    }
}
