//! Core domain types for Citations.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Stable identifier of a chunk in the index.
pub type ChunkId = String;

/// Flat provenance metadata attached to every chunk.
pub type Metadata = BTreeMap<String, String>;

/// The watermark used when nothing has been scanned yet.
///
/// Every file on disk is newer than this, so a first run processes everything.
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Format of a scanned source directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Archive snapshots: extracted page text plus an `index.json` sidecar.
    Archive,
    /// Plain Markdown notes.
    Markdown,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Archive => "archive",
            SourceKind::Markdown => "markdown",
        }
    }
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "archive" | "archivebox" => Ok(SourceKind::Archive),
            "markdown" | "md" => Ok(SourceKind::Markdown),
            other => Err(Error::InvalidInput(format!(
                "Unknown source type '{}'. Expected archive or markdown.",
                other
            ))),
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scalar value of caller-supplied target metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Integer(i) => write!(f, "{}", i),
            MetadataValue::Float(x) => write!(f, "{}", x),
            MetadataValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Text(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Text(s)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One configured directory to scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanTarget {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub directory: PathBuf,
    /// Overrides the `domain` recorded on every chunk from this target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Render Markdown to plain text before chunking.
    #[serde(default, skip_serializing_if = "is_false")]
    pub strip_markup: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl ScanTarget {
    pub fn new(kind: SourceKind, directory: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            directory: directory.into(),
            domain: None,
            strip_markup: false,
            metadata: BTreeMap::new(),
        }
    }

    pub fn archive(directory: impl Into<PathBuf>) -> Self {
        Self::new(SourceKind::Archive, directory)
    }

    pub fn markdown(directory: impl Into<PathBuf>) -> Self {
        Self::new(SourceKind::Markdown, directory)
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_strip_markup(mut self, strip: bool) -> Self {
        self.strip_markup = strip;
        self
    }

    /// Target metadata flattened to strings, plus the `domain` override if set.
    pub fn static_metadata(&self) -> Metadata {
        let mut metadata: Metadata = self
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();
        if let Some(domain) = &self.domain {
            metadata.insert("domain".to_string(), domain.clone());
        }
        metadata
    }
}

/// A bounded-size slice of a document, the unit stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(id: impl Into<ChunkId>, text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
        }
    }
}

/// All chunks of a single source file, upserted as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkBatch {
    pub source_path: PathBuf,
    pub chunks: Vec<Chunk>,
}

impl ChunkBatch {
    pub fn new(source_path: impl Into<PathBuf>, chunks: Vec<Chunk>) -> Self {
        Self {
            source_path: source_path.into(),
            chunks,
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.chunks.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.chunks.iter().map(|c| c.text.as_str()).collect()
    }

    pub fn metadatas(&self) -> Vec<&Metadata> {
        self.chunks.iter().map(|c| &c.metadata).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_parse() {
        assert_eq!("archive".parse::<SourceKind>().unwrap(), SourceKind::Archive);
        assert_eq!("Markdown".parse::<SourceKind>().unwrap(), SourceKind::Markdown);
        assert_eq!("md".parse::<SourceKind>().unwrap(), SourceKind::Markdown);
        assert!("pdf".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_static_metadata_flattens_values() {
        let target = ScanTarget::markdown("/notes")
            .with_metadata("source", "notes")
            .with_metadata("priority", MetadataValue::Integer(3))
            .with_domain("notes.local");

        let metadata = target.static_metadata();
        assert_eq!(metadata.get("source").unwrap(), "notes");
        assert_eq!(metadata.get("priority").unwrap(), "3");
        assert_eq!(metadata.get("domain").unwrap(), "notes.local");
    }

    #[test]
    fn test_scan_target_toml() {
        let target: ScanTarget = toml::from_str(
            r#"
            type = "markdown"
            directory = "/home/me/notes"
            [metadata]
            source = "notes"
            pinned = true
            "#,
        )
        .unwrap();

        assert_eq!(target.kind, SourceKind::Markdown);
        assert_eq!(target.directory, PathBuf::from("/home/me/notes"));
        assert_eq!(target.domain, None);
        assert!(!target.strip_markup);
        assert_eq!(target.metadata.get("source"), Some(&MetadataValue::from("notes")));
        assert_eq!(target.metadata.get("pinned"), Some(&MetadataValue::Bool(true)));
    }

    #[test]
    fn test_batch_accessors() {
        let mut metadata = Metadata::new();
        metadata.insert("domain".to_string(), "example.com".to_string());

        let batch = ChunkBatch::new(
            "/archive/1/htmltotext.txt",
            vec![
                Chunk::new("abc-0", "first", metadata.clone()),
                Chunk::new("abc-1", "second", metadata),
            ],
        );

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.ids(), vec!["abc-0", "abc-1"]);
        assert_eq!(batch.texts(), vec!["first", "second"]);
        assert_eq!(batch.metadatas()[1].get("domain").unwrap(), "example.com");
    }

    #[test]
    fn test_epoch_is_before_now() {
        assert!(epoch() < Utc::now());
        assert_eq!(epoch().timestamp(), 0);
    }
}
