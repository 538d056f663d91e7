//! Watermark gating on file modification times.

use crate::error::{IngestError, IngestResult};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Modification time of a file, in UTC.
pub fn modified_time(path: &Path) -> IngestResult<DateTime<Utc>> {
    let read_error = |e: std::io::Error| IngestError::Read {
        path: path.to_path_buf(),
        source: e,
    };
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(read_error)?;
    Ok(DateTime::<Utc>::from(modified))
}

/// Decides whether a file changed after the last completed scan.
///
/// The boundary is exclusive: a change time equal to the watermark does not
/// qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkFilter {
    watermark: DateTime<Utc>,
}

impl WatermarkFilter {
    pub fn new(watermark: DateTime<Utc>) -> Self {
        Self { watermark }
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }

    pub fn qualifies(&self, changed_at: DateTime<Utc>) -> bool {
        changed_at > self.watermark
    }

    /// Check a file by its own modification time.
    pub fn check(&self, path: &Path) -> IngestResult<bool> {
        Ok(self.qualifies(modified_time(path)?))
    }
}
