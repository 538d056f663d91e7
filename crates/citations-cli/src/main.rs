//! Citations CLI - Incremental indexing of web archives and notes.

mod commands;

use citations_core::SourceKind;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Citations - Index archived web pages and Markdown notes for retrieval
#[derive(Parser)]
#[command(name = "citations")]
#[command(version)]
#[command(about = "Index archived web pages and Markdown notes for retrieval", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the platform default
    #[arg(long, global = true, env = "CITATIONS_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Citations (create config and index)
    Init,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Scan configured directories and index changed files
    Scan(ScanArgs),

    /// Generate embeddings for chunks that lack them
    Embed {
        /// Chunks to embed per round
        #[arg(long, default_value = "10")]
        batch_size: usize,

        /// Collection to embed (default: from config)
        #[arg(long)]
        collection: Option<String>,
    },

    /// Search the index
    Search {
        /// Search query
        query: String,

        /// Maximum results
        #[arg(short = 'n', long, default_value = "3")]
        limit: usize,

        /// Use full-text search instead of embeddings
        #[arg(long)]
        keyword: bool,

        /// Collection to search (default: from config)
        #[arg(long)]
        collection: Option<String>,
    },

    /// Show index statistics
    Stats,

    /// Delete a collection and its embeddings
    Drop {
        /// Collection to delete
        collection: String,
    },
}

/// Options for a scan run.
#[derive(Args, Debug, Default, Clone)]
pub struct ScanArgs {
    /// Scan only this directory instead of the configured targets
    #[arg(long, requires = "kind")]
    pub dir: Option<String>,

    /// Source type for --dir (archive or markdown)
    #[arg(short = 't', long = "type", requires = "dir", value_name = "TYPE")]
    pub kind: Option<SourceKind>,

    /// Collection to write to (default: from config)
    #[arg(long)]
    pub collection: Option<String>,

    /// Directory holding the index (default: from config)
    #[arg(long)]
    pub data_path: Option<String>,

    /// Only index files changed after this time (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub after: Option<String>,

    /// List the files that would be indexed without indexing them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Add a directory to scan
    AddDir {
        /// Directory path
        path: String,

        /// Source type (archive or markdown)
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        kind: SourceKind,

        /// Domain recorded on every chunk from this directory
        #[arg(long)]
        domain: Option<String>,

        /// Render Markdown to plain text before chunking
        #[arg(long)]
        strip_markup: bool,

        /// Extra metadata as key=value (can be repeated)
        #[arg(short, long = "meta", value_name = "KEY=VALUE")]
        meta: Vec<String>,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., chunking.max_tokens)
        key: String,

        /// Value to set
        value: String,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("citations=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("citations=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = commands::config_store(cli.config.as_deref()).and_then(|store| match cli.command {
        Commands::Init => commands::init::run(&store),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(&store),
            ConfigCommands::AddDir {
                path,
                kind,
                domain,
                strip_markup,
                meta,
            } => commands::config::add_dir(&store, &path, kind, domain, strip_markup, &meta),
            ConfigCommands::Set { key, value } => commands::config::set(&store, &key, &value),
        },
        Commands::Scan(args) => commands::scan::run(&store, &args),
        Commands::Embed {
            batch_size,
            collection,
        } => commands::embed::run(&store, batch_size, collection),
        Commands::Search {
            query,
            limit,
            keyword,
            collection,
        } => commands::search::run(&store, &query, limit, keyword, collection),
        Commands::Stats => commands::stats::run(&store),
        Commands::Drop { collection } => commands::drop::run(&store, &collection),
    });

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
