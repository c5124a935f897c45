//! seglog CLI
//!
//! Command-line tools for inspecting and operating on a segmented log.
//!
//! # Commands
//!
//! - `inspect` - Display segments and the offset range
//! - `dump` - Print decoded records
//! - `verify` - Check that every record reads back at its offset
//! - `append` - Append values to the log
//! - `read` - Print a single record
//! - `truncate` - Drop segments below an offset

mod commands;

use clap::{Parser, Subcommand};
use seglog_core::{Config, Log, DEFAULT_MAX_INDEX_BYTES, DEFAULT_MAX_STORE_BYTES};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// seglog command-line log tools.
#[derive(Parser)]
#[command(name = "seglog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the log directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Maximum store size per segment in bytes
    #[arg(global = true, long, default_value_t = DEFAULT_MAX_STORE_BYTES)]
    max_store_bytes: u64,

    /// Maximum index size per segment in bytes
    #[arg(global = true, long, default_value_t = DEFAULT_MAX_INDEX_BYTES)]
    max_index_bytes: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display segments and the offset range
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print decoded records
    Dump {
        /// Start from this offset (defaults to the lowest offset)
        #[arg(short, long)]
        offset: Option<u64>,

        /// Maximum number of records to dump
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check that every record reads back at its own offset
    Verify,

    /// Append UTF-8 values and print their offsets
    Append {
        /// Values to append, in order
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Print the record at an offset
    Read {
        /// Offset to read
        offset: u64,
    },

    /// Remove segments whose records are all at or below an offset
    Truncate {
        /// Highest offset that may be dropped
        lowest: u64,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::new()
        .max_store_bytes(cli.max_store_bytes)
        .max_index_bytes(cli.max_index_bytes);

    match cli.command {
        Commands::Inspect { format } => {
            let log = open_existing(cli.path.as_deref(), config, "inspect")?;
            commands::inspect::run(&log, &format)?;
        }
        Commands::Dump {
            offset,
            limit,
            format,
        } => {
            let log = open_existing(cli.path.as_deref(), config, "dump")?;
            commands::dump::run(&log, offset, limit, &format)?;
        }
        Commands::Verify => {
            let log = open_existing(cli.path.as_deref(), config, "verify")?;
            commands::verify::run(&log)?;
        }
        Commands::Append { values } => {
            let path = cli.path.ok_or("Log path required for append")?;
            let log = Log::open(&path, config)?;
            commands::append::run(&log, &values)?;
        }
        Commands::Read { offset } => {
            let log = open_existing(cli.path.as_deref(), config, "read")?;
            commands::read::run(&log, offset)?;
        }
        Commands::Truncate { lowest } => {
            let log = open_existing(cli.path.as_deref(), config, "truncate")?;
            commands::truncate::run(&log, lowest)?;
        }
        Commands::Version => {
            println!("seglog CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("seglog core v{}", seglog_core::VERSION);
        }
    }

    Ok(())
}

/// Opens a log directory that already holds segments.
///
/// A missing or segment-free directory is rejected so that inspecting a
/// wrong path does not leave a fresh log behind. Opening still resizes the
/// index files of an existing log.
fn open_existing(
    path: Option<&Path>,
    config: Config,
    command: &str,
) -> Result<Log, Box<dyn std::error::Error>> {
    let path = path.ok_or_else(|| format!("Log path required for {command}"))?;
    if !path.is_dir() || seglog_core::dir::list_base_offsets(path)?.is_empty() {
        return Err(format!("No log found at {}", path.display()).into());
    }
    Ok(Log::open(path, config)?)
}
