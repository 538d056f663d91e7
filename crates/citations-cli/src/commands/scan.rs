//! Scan command - index files changed since the last scan.

use super::config::parse_timestamp;
use super::{index_dir, load_config, open_database};
use crate::ScanArgs;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use citations_config::{Config, ConfigStore};
use citations_core::ScanTarget;
use citations_ingest::{
    ChunkConfig, Chunker, Cl100kCounter, IndexHandle, ScanEvent, ScanOrchestrator, ScanReport,
};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What to scan once command-line overrides are applied.
#[derive(Debug)]
pub struct ScanPlan {
    pub targets: Vec<ScanTarget>,
    pub watermark: DateTime<Utc>,
    pub collection: String,
    pub index_dir: PathBuf,
    /// Persist the watermark afterwards. Only for full scans of the
    /// configured targets against the stored watermark, written to the
    /// configured collection and index.
    pub commit: bool,
}

impl ScanPlan {
    pub fn new(config: &Config, args: &ScanArgs) -> Result<Self> {
        let targets = match (&args.dir, args.kind) {
            (Some(dir), Some(kind)) => {
                let mut config = Config::default();
                config.add_target(ScanTarget::new(kind, dir));
                config.resolved_targets()
            }
            (Some(_), None) => anyhow::bail!("--type is required with --dir"),
            _ => config.resolved_targets(),
        };

        let watermark = match &args.after {
            Some(after) => parse_timestamp(after)?,
            None => config.last_scan_time,
        };

        let collection = args
            .collection
            .clone()
            .unwrap_or_else(|| config.index.collection.clone());
        let dir = index_dir(config, args.data_path.as_deref())?;

        // The stored watermark only describes the configured collection in
        // the configured index.
        let configured_index = collection == config.index.collection
            && index_dir(config, None)
                .map(|configured| configured == dir)
                .unwrap_or(false);

        Ok(Self {
            targets,
            watermark,
            collection,
            index_dir: dir,
            commit: args.dir.is_none()
                && args.after.is_none()
                && !args.dry_run
                && configured_index,
        })
    }
}

pub fn run(store: &ConfigStore, args: &ScanArgs) -> Result<()> {
    let config = load_config(store)?;
    let plan = ScanPlan::new(&config, args)?;

    if plan.targets.is_empty() {
        println!("{} No directories to scan.", "Note:".yellow());
        println!(
            "  Add one with {}",
            "citations config add-dir <PATH> --type markdown".cyan()
        );
        return Ok(());
    }

    let counter = Cl100kCounter::new().context("Failed to load tokenizer")?;
    let chunker = Arc::new(Chunker::new(
        ChunkConfig::from_chunking_config(&config.chunking),
        Arc::new(counter),
    ));
    let db = open_database(&plan.index_dir)?;
    let index = IndexHandle::new(db, plan.collection.clone());

    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = interrupt.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl-C handler")?;

    println!(
        "{} {} target(s) into '{}', files changed after {}",
        if args.dry_run { "Previewing:" } else { "Scanning:" }.cyan().bold(),
        plan.targets.len(),
        plan.collection,
        plan.watermark.to_rfc3339()
    );

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    let observer = |event: ScanEvent<'_>| match event {
        ScanEvent::TargetStarted(target) => {
            pb.set_message(format!("Scanning {}", target.directory.display()));
        }
        ScanEvent::Indexed { path, chunks } => {
            pb.set_message(format!("Indexed {} ({} chunks)", path.display(), chunks));
        }
        ScanEvent::Pending(path) => {
            pb.println(format!("  {} {}", "Would index:".cyan(), path.display()));
        }
        ScanEvent::Failed(failure) => {
            pb.println(format!("  {} {}", "Skipped:".yellow(), failure));
        }
    };

    let orchestrator = ScanOrchestrator::new(&index, chunker)
        .with_interrupt(interrupt)
        .with_observer(&observer)
        .dry_run(args.dry_run);

    let report = if plan.commit {
        orchestrator.run_and_commit(store)?
    } else {
        orchestrator.run(&plan.targets, plan.watermark)?
    };

    pb.finish_and_clear();
    print_report(&report, &plan);

    Ok(())
}

fn print_report(report: &ScanReport, plan: &ScanPlan) {
    println!();
    for target in &report.targets {
        println!(
            "{} {} {}",
            "•".cyan(),
            target.directory.display().to_string().white().bold(),
            format!("[{}]", target.kind).dimmed()
        );
        println!(
            "  {} indexed ({} chunks), {} unchanged, {} empty, {} failed",
            target.batches.to_string().green(),
            target.chunks,
            target.unchanged,
            target.empty,
            if target.failed > 0 {
                target.failed.to_string().red()
            } else {
                target.failed.to_string().normal()
            }
        );
    }

    if report.dry_run {
        println!();
        println!(
            "{} {} file(s) would be indexed.",
            "Dry run:".yellow().bold(),
            report.pending.len()
        );
        return;
    }

    println!();
    println!(
        "{} {} file(s), {} chunk(s) into '{}'",
        "Indexed".green().bold(),
        report.batches(),
        report.chunks(),
        plan.collection
    );

    if !report.failures.is_empty() {
        println!(
            "{} {} file(s) skipped, see warnings above",
            "Note:".yellow(),
            report.failures.len()
        );
    }

    match report.next_watermark() {
        Some(next) if plan.commit => {
            println!("  Watermark advanced to {}", next.to_rfc3339());
        }
        Some(_) => {
            println!(
                "  {}",
                "Watermark unchanged (scan used --dir, --after, --collection or --data-path)."
                    .dimmed()
            );
        }
        None => {
            println!(
                "{} Scan interrupted; watermark unchanged. Rerun to pick up the rest.",
                "Note:".yellow()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use citations_core::SourceKind;

    fn config() -> Config {
        let mut config = Config::default();
        config.last_scan_time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        config.index.data_path = Some("/tmp/citations-test-index".to_string());
        config.add_target(ScanTarget::archive("/srv/archive"));
        config.add_target(ScanTarget::markdown("/srv/notes"));
        config
    }

    #[test]
    fn test_plan_uses_config_by_default() {
        let plan = ScanPlan::new(&config(), &ScanArgs::default()).unwrap();

        assert_eq!(plan.targets.len(), 2);
        assert_eq!(plan.watermark, config().last_scan_time);
        assert_eq!(plan.collection, "citations");
        assert_eq!(plan.index_dir, PathBuf::from("/tmp/citations-test-index"));
        assert!(plan.commit);
    }

    #[test]
    fn test_plan_overrides() {
        let args = ScanArgs {
            dir: Some("/tmp/elsewhere".to_string()),
            kind: Some(SourceKind::Markdown),
            collection: Some("scratch".to_string()),
            data_path: Some("/tmp/other-index".to_string()),
            after: Some("2024-06-01".to_string()),
            dry_run: false,
        };
        let plan = ScanPlan::new(&config(), &args).unwrap();

        assert_eq!(plan.targets, vec![ScanTarget::markdown("/tmp/elsewhere")]);
        assert_eq!(plan.watermark, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(plan.collection, "scratch");
        assert_eq!(plan.index_dir, PathBuf::from("/tmp/other-index"));
        assert!(!plan.commit);
    }

    #[test]
    fn test_dry_run_never_commits() {
        let args = ScanArgs {
            dry_run: true,
            ..Default::default()
        };
        assert!(!ScanPlan::new(&config(), &args).unwrap().commit);
    }

    #[test]
    fn test_dir_without_type_is_rejected() {
        let args = ScanArgs {
            dir: Some("/tmp/x".to_string()),
            ..Default::default()
        };
        assert!(ScanPlan::new(&config(), &args).is_err());
    }

    #[test]
    fn test_other_collection_does_not_commit() {
        let args = ScanArgs {
            collection: Some("scratch".to_string()),
            ..Default::default()
        };
        let plan = ScanPlan::new(&config(), &args).unwrap();

        assert_eq!(plan.targets.len(), 2);
        assert!(!plan.commit);
    }

    #[test]
    fn test_other_data_path_does_not_commit() {
        let args = ScanArgs {
            data_path: Some("/tmp/other-index".to_string()),
            ..Default::default()
        };
        let plan = ScanPlan::new(&config(), &args).unwrap();

        assert_eq!(plan.index_dir, PathBuf::from("/tmp/other-index"));
        assert!(!plan.commit);
    }

    #[test]
    fn test_naming_the_configured_index_still_commits() {
        let args = ScanArgs {
            collection: Some("citations".to_string()),
            data_path: Some("/tmp/citations-test-index".to_string()),
            ..Default::default()
        };
        assert!(ScanPlan::new(&config(), &args).unwrap().commit);
    }
}
