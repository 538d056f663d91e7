//! Snapshot sidecar metadata (`index.json`).

use crate::error::{IngestError, IngestResult};
use serde::Deserialize;
use std::path::Path;

/// The fields read from a snapshot's `index.json`. Other keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SnapshotSidecar {
    /// Content hash of the snapshot, the stem of every chunk id.
    pub hash: String,
    /// Canonical address of the archived page.
    pub base_url: String,
    /// Host part of the archived page's address.
    pub domain: String,
}

impl SnapshotSidecar {
    /// Read and parse a sidecar file.
    pub fn load(path: &Path) -> IngestResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| IngestError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(path, &contents)
    }

    /// Parse sidecar contents; `path` is only used for error reporting.
    pub fn parse(path: &Path, contents: &str) -> IngestResult<Self> {
        let sidecar: SnapshotSidecar =
            serde_json::from_str(contents).map_err(|e| IngestError::MalformedSidecar {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if sidecar.hash.trim().is_empty() {
            return Err(IngestError::MalformedSidecar {
                path: path.to_path_buf(),
                message: "hash is empty".to_string(),
            });
        }

        Ok(sidecar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_extra_fields() {
        let sidecar = SnapshotSidecar::parse(
            Path::new("index.json"),
            r#"{
                "url": "https://example.com/post?utm=1",
                "timestamp": "1700000000.0",
                "hash": "abc123",
                "base_url": "example.com/post",
                "domain": "example.com",
                "history": {}
            }"#,
        )
        .unwrap();

        assert_eq!(sidecar.hash, "abc123");
        assert_eq!(sidecar.base_url, "example.com/post");
        assert_eq!(sidecar.domain, "example.com");
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = SnapshotSidecar::parse(
            Path::new("/a/index.json"),
            r#"{"hash": "abc123", "domain": "example.com"}"#,
        )
        .unwrap_err();

        match err {
            IngestError::MalformedSidecar { path, message } => {
                assert_eq!(path, Path::new("/a/index.json"));
                assert!(message.contains("base_url"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_json_and_empty_hash() {
        let path = Path::new("index.json");
        assert!(matches!(
            SnapshotSidecar::parse(path, "{not json"),
            Err(IngestError::MalformedSidecar { .. })
        ));
        assert!(matches!(
            SnapshotSidecar::parse(path, r#"{"hash": " ", "base_url": "x", "domain": "y"}"#),
            Err(IngestError::MalformedSidecar { .. })
        ));
    }
}
