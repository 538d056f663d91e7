//! Configuration commands.

use super::load_config;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use citations_config::{expand_path, Config, ConfigStore};
use citations_core::{MetadataValue, ScanTarget, SourceKind};
use colored::Colorize;
use std::path::Path;

pub fn show(store: &ConfigStore) -> Result<()> {
    println!("{}", "Current Configuration".cyan().bold());
    println!("{}", "─".repeat(50));

    if !store.path().exists() {
        println!(
            "{} No config at {}, using defaults. Run 'citations init' to create one.",
            "Note:".yellow(),
            store.path().display()
        );
        println!();
        println!("{}", Config::default_config_string());
        return Ok(());
    }

    let contents = std::fs::read_to_string(store.path()).context("Failed to read config file")?;
    println!("{}", contents);

    Ok(())
}

pub fn add_dir(
    store: &ConfigStore,
    path: &str,
    kind: SourceKind,
    domain: Option<String>,
    strip_markup: bool,
    meta: &[String],
) -> Result<()> {
    let expanded = expand_path(Path::new(path));
    if !expanded.is_dir() {
        anyhow::bail!("Directory does not exist: {}", expanded.display());
    }

    let mut target = ScanTarget::new(kind, path).with_strip_markup(strip_markup);
    if let Some(domain) = domain {
        target = target.with_domain(domain);
    }
    for pair in meta {
        let (key, value) = parse_meta(pair)?;
        target = target.with_metadata(key, value);
    }

    let mut config = load_config(store)?;
    if !config.add_target(target) {
        println!(
            "{} Directory already configured as {}: {}",
            "Note:".yellow(),
            kind,
            path
        );
        return Ok(());
    }

    store.save(&config).context("Failed to save config")?;
    println!("{} Added {} directory: {}", "✓".green(), kind, path);

    Ok(())
}

pub fn set(store: &ConfigStore, key: &str, value: &str) -> Result<()> {
    let mut config = load_config(store)?;
    apply_setting(&mut config, key, value)?;
    config.validate()?;

    store.save(&config).context("Failed to save config")?;
    println!("{} Set {} = {}", "✓".green(), key.cyan(), value);

    Ok(())
}

/// Apply one `section.key = value` assignment.
pub fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        // Setting the watermark directly may move it backwards to force a rescan
        ["last_scan_time"] => config.last_scan_time = parse_timestamp(value)?,
        ["chunking", "max_tokens"] => {
            config.chunking.max_tokens = value.parse().context("Invalid max_tokens value")?;
        }
        ["chunking", "overlap_tokens"] => {
            config.chunking.overlap_tokens =
                value.parse().context("Invalid overlap_tokens value")?;
        }
        ["index", "collection"] => config.index.collection = value.to_string(),
        ["index", "data_path"] => config.index.data_path = Some(value.to_string()),
        ["ollama", "host"] => config.ollama.host = value.to_string(),
        ["ollama", "embedding_model"] => config.ollama.embedding_model = value.to_string(),
        ["ollama", "timeout_seconds"] => {
            config.ollama.timeout_seconds = value.parse().context("Invalid timeout value")?;
        }
        _ => {
            anyhow::bail!("Unknown config key: {}", key);
        }
    }

    Ok(())
}

/// Parse an RFC 3339 timestamp, a naive `YYYY-MM-DDTHH:MM:SS` (UTC), or a date.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    anyhow::bail!(
        "Invalid timestamp '{}'. Use RFC 3339 (2024-01-31T12:00:00Z) or YYYY-MM-DD.",
        value
    )
}

/// Parse `key=value`, typing the value as bool, integer, float, or text.
fn parse_meta(pair: &str) -> Result<(String, MetadataValue)> {
    let (key, raw) = pair
        .split_once('=')
        .with_context(|| format!("Metadata must be KEY=VALUE, got '{}'", pair))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Metadata key is empty in '{}'", pair);
    }

    let value = if let Ok(b) = raw.parse::<bool>() {
        MetadataValue::Bool(b)
    } else if let Ok(i) = raw.parse::<i64>() {
        MetadataValue::Integer(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        MetadataValue::Float(f)
    } else {
        MetadataValue::Text(raw.to_string())
    };

    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use citations_core::epoch;

    #[test]
    fn test_apply_setting() {
        let mut config = Config::default();
        apply_setting(&mut config, "chunking.max_tokens", "512").unwrap();
        apply_setting(&mut config, "index.collection", "notes").unwrap();
        apply_setting(&mut config, "ollama.timeout_seconds", "30").unwrap();

        assert_eq!(config.chunking.max_tokens, 512);
        assert_eq!(config.index.collection, "notes");
        assert_eq!(config.ollama.timeout_seconds, 30);

        assert!(apply_setting(&mut config, "chunking.max_tokens", "lots").is_err());
        assert!(apply_setting(&mut config, "ui.color", "true").is_err());
    }

    #[test]
    fn test_watermark_can_be_reset() {
        let mut config = Config::default();
        config.last_scan_time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        apply_setting(&mut config, "last_scan_time", "1970-01-01T00:00:00Z").unwrap();
        assert_eq!(config.last_scan_time, epoch());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01T00:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01T01:00:00+01:00").unwrap(), expected);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_parse_meta_types() {
        assert_eq!(
            parse_meta("source=notes").unwrap(),
            ("source".to_string(), MetadataValue::Text("notes".to_string()))
        );
        assert_eq!(parse_meta("pinned=true").unwrap().1, MetadataValue::Bool(true));
        assert_eq!(parse_meta("rank=3").unwrap().1, MetadataValue::Integer(3));
        assert_eq!(parse_meta("weight=0.5").unwrap().1, MetadataValue::Float(0.5));
        assert!(parse_meta("novalue").is_err());
        assert!(parse_meta("=x").is_err());
    }

    #[test]
    fn test_add_dir_persists_target() {
        let notes = tempfile::tempdir().unwrap();
        let conf = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(conf.path().join("config.toml"));
        let path = notes.path().to_string_lossy().into_owned();

        add_dir(
            &store,
            &path,
            SourceKind::Markdown,
            Some("notes.local".to_string()),
            true,
            &["source=notes".to_string()],
        )
        .unwrap();
        // Adding the same directory again is a no-op
        add_dir(&store, &path, SourceKind::Markdown, None, false, &[]).unwrap();

        let config = store.load().unwrap();
        assert_eq!(config.data_dirs.len(), 1);
        let target = &config.data_dirs[0];
        assert_eq!(target.domain.as_deref(), Some("notes.local"));
        assert!(target.strip_markup);
        assert_eq!(target.metadata.get("source"), Some(&MetadataValue::from("notes")));
    }

    #[test]
    fn test_add_missing_dir_fails() {
        let conf = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(conf.path().join("config.toml"));
        assert!(add_dir(&store, "/no/such/dir", SourceKind::Archive, None, false, &[]).is_err());
    }
}
