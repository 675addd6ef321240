//! # KB Harness CLI (`kbh`)
//!
//! The `kbh` binary keeps a knowledge-base manifest in sync with the files
//! on disk, drives incremental ingestion into per-project retrieval
//! engines, and answers queries.
//!
//! ## Usage
//!
//! ```bash
//! kbh --config ./config/kbh.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kbh sync` | Reconcile the manifest with the files on disk |
//! | `kbh ingest` | Ingest new and changed documents into the engine |
//! | `kbh query "<text>"` | Ask the retrieval engine a question |
//! | `kbh status` | Show manifest and knowledge-base health |
//!
//! ## Examples
//!
//! ```bash
//! # Preview what a sync would change
//! kbh sync --dry-run
//!
//! # Adopt new files and drop entries for deleted ones
//! kbh sync
//!
//! # Push new/changed documents into the "platform" project
//! kbh ingest --project platform
//!
//! # Ask with a specific retrieval mode
//! kbh query "how do we rotate credentials?" --mode hybrid --project platform
//! ```
//!
//! Log lines go to stderr (filterable via `RUST_LOG`); stdout carries only
//! command summaries and query answers, so it stays parseable for scripts.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use kb_harness::retrieval::{QueryMode, RetrievalGateway};
use kb_harness::{config, ingest, query, status, sync};

/// KB Harness — a manifest-driven knowledge base ingestion and retrieval
/// CLI.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file describing the manifest path, the knowledge-base root, and the
/// retrieval provider.
#[derive(Parser)]
#[command(
    name = "kbh",
    about = "KB Harness — manifest-driven knowledge base ingestion and retrieval",
    version,
    long_about = "KB Harness reconciles a knowledge-base directory against a human-editable \
    YAML manifest, ingests new or changed documents into per-project retrieval engines using \
    content hashes for change detection, and exposes a query entry point."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/kbh.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Reconcile the manifest with the files on disk.
    ///
    /// New files get classifier-derived default metadata; entries for
    /// deleted files are dropped; everything else is kept verbatim. The
    /// manifest is only rewritten when something changed.
    Sync {
        /// Compute and report changes without writing the manifest.
        #[arg(long)]
        dry_run: bool,
    },

    /// Ingest new and changed documents into the retrieval engine.
    ///
    /// Files whose content hash matches the manifest are skipped. Per-file
    /// failures are reported in the summary and retried on the next run;
    /// the process exits 1 if any file failed.
    Ingest {
        /// Target project; each project has an isolated engine and index
        /// directory.
        #[arg(long, default_value = "default")]
        project: String,
    },

    /// Ask the retrieval engine a question.
    ///
    /// Prints the answer to stdout. The manifest is not consulted.
    Query {
        /// The question to ask.
        query: String,

        /// Retrieval strategy.
        #[arg(long, value_enum, default_value_t = QueryMode::Mix)]
        mode: QueryMode,

        /// Project whose knowledge to query.
        #[arg(long, default_value = "default")]
        project: String,
    },

    /// Show manifest and knowledge-base health.
    ///
    /// Read-only: compares the manifest against the current disk listing
    /// and prints tracked/untracked/missing/ingested counts.
    Status,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Sync { dry_run } => {
            sync::run_sync(&cfg, dry_run)?;
        }
        Commands::Ingest { project } => {
            let mut gateway = RetrievalGateway::new(cfg.retrieval.clone());
            let report = ingest::run_ingest(&cfg, &project, &mut gateway)?;
            gateway.shutdown();
            if !report.failures.is_empty() {
                std::process::exit(1);
            }
        }
        Commands::Query {
            query: text,
            mode,
            project,
        } => {
            let mut gateway = RetrievalGateway::new(cfg.retrieval.clone());
            query::run_query(&mut gateway, &project, &text, mode)?;
            gateway.shutdown();
        }
        Commands::Status => {
            status::run_status(&cfg)?;
        }
    }

    Ok(())
}
