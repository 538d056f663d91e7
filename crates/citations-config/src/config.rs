//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use crate::paths::AppPaths;
use chrono::{DateTime, Utc};
use citations_core::{epoch, ScanTarget};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure.
///
/// Scalar keys come first so the TOML serializer never has to emit a value
/// after a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Start time of the last fully completed scan.
    #[serde(default = "epoch")]
    pub last_scan_time: DateTime<Utc>,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_dirs: Vec<ScanTarget>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            last_scan_time: epoch(),
            chunking: ChunkingConfig::default(),
            index: IndexConfig::default(),
            ollama: OllamaConfig::default(),
            data_dirs: vec![],
        }
    }
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// A missing file yields the defaults: no targets and an epoch watermark.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Create a default config file with comments.
    pub fn create_default_file(path: &Path) -> ConfigResult<()> {
        let default_config = Self::default_config_string();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, default_config)?;
        Ok(())
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# Citations Configuration

# Start of the last completed scan (ISO-8601, UTC). Files whose change time
# is not after this are skipped on the next scan.
last_scan_time = "1970-01-01T00:00:00Z"

[chunking]
# Maximum tokens per chunk (cl100k_base tokenizer)
max_tokens = 256

# Tokens shared between adjacent chunks (0 disables overlap)
overlap_tokens = 50

[index]
# Collection that scanned chunks are written to
collection = "citations"

# Directory holding the index database
# data_path = "~/.local/share/citations-ai/data"

[ollama]
# Ollama server address
host = "http://localhost:11434"

# Model for generating embeddings
embedding_model = "nomic-embed-text"

# Request timeout in seconds
timeout_seconds = 120

# Directories to scan. Add one [[data_dirs]] block per directory.
#
# [[data_dirs]]
# type = "archive"
# directory = "~/archivebox/archive"
#
# [[data_dirs]]
# type = "markdown"
# directory = "~/notes"
# domain = "notes.local"
# [data_dirs.metadata]
# source = "notes"
"#
        .to_string()
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.chunking.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "chunking.max_tokens must be > 0".to_string(),
            ));
        }
        if self.chunking.overlap_tokens >= self.chunking.max_tokens {
            return Err(ConfigError::Invalid(format!(
                "chunking.overlap_tokens ({}) must be smaller than chunking.max_tokens ({})",
                self.chunking.overlap_tokens, self.chunking.max_tokens
            )));
        }
        if self.index.collection.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "index.collection must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Add a scan target unless the same directory is already configured.
    pub fn add_target(&mut self, target: ScanTarget) -> bool {
        if self
            .data_dirs
            .iter()
            .any(|t| t.directory == target.directory && t.kind == target.kind)
        {
            return false;
        }
        self.data_dirs.push(target);
        true
    }

    /// Configured targets with `~` and environment variables expanded.
    pub fn resolved_targets(&self) -> Vec<ScanTarget> {
        self.data_dirs
            .iter()
            .map(|target| {
                let mut target = target.clone();
                target.directory = expand_path(&target.directory);
                target
            })
            .collect()
    }

    /// Move the watermark forward. Never moves it backwards.
    pub fn advance_watermark(&mut self, to: DateTime<Utc>) -> bool {
        if to > self.last_scan_time {
            self.last_scan_time = to;
            true
        } else {
            false
        }
    }
}

/// Expand `~` and `$VARS` in a configured path, leaving it untouched on failure.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => path.to_path_buf(),
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
    pub overlap_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: 256,
            overlap_tokens: 50,
        }
    }
}

/// Vector index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            collection: "citations".to_string(),
            data_path: None,
        }
    }
}

impl IndexConfig {
    /// Directory holding the index, falling back to the platform data dir.
    pub fn data_dir(&self, paths: &AppPaths) -> PathBuf {
        match &self.data_path {
            Some(p) => expand_path(Path::new(p)),
            None => paths.index_dir.clone(),
        }
    }
}

/// Ollama embedding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub embedding_model: String,
    pub timeout_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            timeout_seconds: 120,
        }
    }
}
