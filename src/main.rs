//! # Inventory Delta CLI (`invd`)
//!
//! ## Usage
//!
//! ```bash
//! invd --config ./config/invd.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `invd init` | Create the SQLite database and schema |
//! | `invd sources` | List configured brands and their files |
//! | `invd ingest` | Load brand CSVs, save today's snapshot, report changes |
//! | `invd report` | Compare stored snapshots |
//! | `invd compare` | Compare two sets of brand CSVs without touching history |
//! | `invd history` | List stored snapshots |
//! | `invd snapshot export` | Write a stored snapshot as a portable document |
//! | `invd clear --yes` | Delete all stored snapshots |
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `warn`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use inventory_delta::compare_cmd::{self, CompareArgs};
use inventory_delta::config;
use inventory_delta::export;
use inventory_delta::history;
use inventory_delta::ingest::{self, IngestArgs};
use inventory_delta::migrate;
use inventory_delta::report_cmd;
use inventory_delta::sources;

#[derive(Parser)]
#[command(
    name = "invd",
    about = "Daily inventory snapshots and change reports for brand CSV exports",
    version
)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./config/invd.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and schema (safe to re-run)
    Init,

    /// List configured brands and whether their files exist
    Sources,

    /// Load brand CSVs, capture today's snapshot, and report changes
    Ingest {
        /// Extra brand file as BRAND=PATH (repeatable)
        #[arg(long = "file", value_parser = parse_key_val)]
        files: Vec<(String, String)>,

        /// Only ingest these brands (repeatable)
        #[arg(long)]
        only: Vec<String>,

        /// Portable snapshot to compare against instead of history
        #[arg(long)]
        previous: Option<PathBuf>,

        /// Write the merged export CSV here
        #[arg(long)]
        export: Option<PathBuf>,

        /// Write today's snapshot as a portable document here
        #[arg(long)]
        snapshot_out: Option<PathBuf>,

        /// Compare and report without saving to history
        #[arg(long)]
        dry_run: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Capture as if run on this date (YYYY-MM-DD)
        #[arg(long, hide = true)]
        as_of: Option<String>,
    },

    /// Compare a stored snapshot against the one before it
    Report {
        /// Snapshot date (YYYY-MM-DD); defaults to the latest
        #[arg(long)]
        date: Option<String>,

        /// Portable snapshot to compare against instead of history
        #[arg(long)]
        previous: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two sets of brand CSVs directly (history is not used)
    Compare {
        /// Previous brand file as BRAND=PATH (repeatable)
        #[arg(long = "previous-file", value_parser = parse_key_val)]
        previous_files: Vec<(String, String)>,

        /// Current brand file as BRAND=PATH (repeatable)
        #[arg(long = "file", value_parser = parse_key_val)]
        files: Vec<(String, String)>,

        /// Write the merged export CSV here
        #[arg(long)]
        export: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored snapshots
    History,

    /// Portable snapshot documents
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },

    /// Delete all stored snapshots
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum SnapshotAction {
    /// Write a stored snapshot as JSON (stdout unless --output)
    Export {
        /// Snapshot date (YYYY-MM-DD); defaults to the latest
        #[arg(long)]
        date: Option<String>,

        /// Output file path
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid BRAND=PATH: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn to_paths(pairs: Vec<(String, String)>) -> Vec<(String, PathBuf)> {
    pairs
        .into_iter()
        .map(|(brand, path)| (brand, PathBuf::from(path)))
        .collect()
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Ingest {
            files,
            only,
            previous,
            export,
            snapshot_out,
            dry_run,
            json,
            as_of,
        } => {
            let args = IngestArgs {
                files: to_paths(files),
                only,
                previous,
                export,
                snapshot_out,
                dry_run,
                json,
                as_of: as_of
                    .as_deref()
                    .map(report_cmd::parse_date_arg)
                    .transpose()?,
            };
            ingest::run_ingest(&cfg, &args).await?;
        }
        Commands::Report {
            date,
            previous,
            json,
        } => {
            report_cmd::run_report(&cfg, date.as_deref(), previous.as_deref(), json).await?;
        }
        Commands::Compare {
            previous_files,
            files,
            export,
            json,
        } => {
            let args = CompareArgs {
                previous_files: to_paths(previous_files),
                files: to_paths(files),
                export,
                json,
            };
            compare_cmd::run_compare(&cfg, &args).await?;
        }
        Commands::History => {
            history::run_history(&cfg).await?;
        }
        Commands::Snapshot {
            action: SnapshotAction::Export { date, output },
        } => {
            export::run_snapshot_export(&cfg, date.as_deref(), output.as_deref()).await?;
        }
        Commands::Clear { yes } => {
            history::run_clear(&cfg, yes).await?;
        }
    }

    Ok(())
}
