//! treesync - mirror one directory tree onto another.
//!
//! Usage:
//!   treesync -s SRC -d DST           Make DST an exact copy of SRC
//!   treesync -s SRC -d DST -t -l     Dry run, write copy.txt and del.txt
//!   treesync --config sync.toml      Take settings from a TOML file
//!   treesync --help                  Show help

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use serde::Deserialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use treesync_core::{HashAlgorithm, HashErrorPolicy, SyncConfig};
use treesync_ops::{SyncOutcome, Synchronizer};

const DEFAULT_COPY_FILE: &str = "copy.txt";
const DEFAULT_DELETE_FILE: &str = "del.txt";

#[derive(Parser, Debug)]
#[command(
    name = "treesync",
    version,
    about = "One-way directory tree synchronization",
    long_about = "treesync makes a destination directory match a source directory.\n\n\
                  Missing and changed files are copied, files that only exist in the \
                  destination are deleted. Files of equal size are compared by content hash."
)]
struct Cli {
    /// Source directory
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Destination directory
    #[arg(short, long)]
    destination: Option<PathBuf>,

    /// Compute the plan without changing the destination
    #[arg(short = 't', long, visible_alias = "test")]
    dry_run: bool,

    /// Content hash algorithm (md5, crc32, blake3)
    #[arg(long)]
    hash: Option<HashAlgorithm>,

    /// Number of worker threads (0 = one per CPU)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Write the copy and delete lists to report files
    #[arg(short, long)]
    list: bool,

    /// Report file for the copy list [default: ./copy.txt]
    #[arg(long)]
    copy_file: Option<PathBuf>,

    /// Report file for the delete list [default: ./del.txt]
    #[arg(long)]
    delete_file: Option<PathBuf>,

    /// Hash every file present on both sides, even when sizes differ
    #[arg(long)]
    always_hash: bool,

    /// What to do with files that cannot be hashed (copy, skip)
    #[arg(long)]
    on_hash_error: Option<HashErrorPolicy>,

    /// Stop applying the plan after the first failure
    #[arg(long)]
    fail_fast: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    /// Load settings from a TOML file; flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Settings file contents. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Settings {
    source: Option<PathBuf>,
    destination: Option<PathBuf>,
    hash: Option<HashAlgorithm>,
    jobs: Option<usize>,
    dry_run: Option<bool>,
    fail_fast: Option<bool>,
    size_shortcut: Option<bool>,
    on_hash_error: Option<HashErrorPolicy>,
    list: Option<bool>,
    copy_file: Option<PathBuf>,
    delete_file: Option<PathBuf>,
}

impl Settings {
    fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read settings from {}", path.display()))?;
        toml::from_str(&content)
            .wrap_err_with(|| format!("Invalid settings file {}", path.display()))
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let config = build_config(&cli, settings)?;
    debug!(?config, "resolved configuration");

    let synchronizer = Synchronizer::new(config).wrap_err("Invalid configuration")?;
    let outcome = synchronizer.run().wrap_err("Sync failed")?;

    print_outcome(&outcome, cli.format)?;

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

/// Install the log subscriber. `RUST_LOG` overrides the flag-derived level.
fn init_logging(quiet: bool, verbose: bool) {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Merge flags over file settings into a sync config.
fn build_config(cli: &Cli, settings: Settings) -> Result<SyncConfig> {
    let source = cli
        .source
        .clone()
        .or(settings.source)
        .ok_or_else(|| eyre!("A source directory is required (--source)"))?;
    let destination = cli
        .destination
        .clone()
        .or(settings.destination)
        .ok_or_else(|| eyre!("A destination directory is required (--destination)"))?;

    let list = cli.list || settings.list.unwrap_or(false);
    let copy_report = list.then(|| {
        cli.copy_file
            .clone()
            .or(settings.copy_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_COPY_FILE))
    });
    let delete_report = list.then(|| {
        cli.delete_file
            .clone()
            .or(settings.delete_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DELETE_FILE))
    });

    let size_shortcut = !cli.always_hash && settings.size_shortcut.unwrap_or(true);

    SyncConfig::builder()
        .source(source)
        .destination(destination)
        .hash_algorithm(cli.hash.or(settings.hash).unwrap_or_default())
        .concurrency(cli.jobs.or(settings.jobs).unwrap_or(0))
        .dry_run(cli.dry_run || settings.dry_run.unwrap_or(false))
        .fail_fast(cli.fail_fast || settings.fail_fast.unwrap_or(false))
        .size_shortcut(size_shortcut)
        .on_hash_error(cli.on_hash_error.or(settings.on_hash_error).unwrap_or_default())
        .copy_report(copy_report)
        .delete_report(delete_report)
        .build()
        .wrap_err("Invalid configuration")
}

fn print_outcome(outcome: &SyncOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outcome)?);
        }
        OutputFormat::Text => print_text(outcome),
    }
    Ok(())
}

fn print_text(outcome: &SyncOutcome) {
    let plan = &outcome.plan;

    println!(
        "Plan: {} to copy ({}), {} to delete",
        plan.copy.len(),
        format_size(plan.copy.total_bytes()),
        plan.delete.len()
    );
    for error in &plan.hash_failures {
        println!("  unreadable  {error}");
    }

    let Some(report) = &outcome.report else {
        // Dry run: show what would happen, in application order.
        for entry in &plan.delete {
            println!("  - {}", entry.display_path());
        }
        for entry in &plan.copy {
            println!("  + {}", entry.display_path());
        }
        return;
    };

    println!("{} ({})", report.summary(), format_size(report.bytes_copied()));
    for error in report.failures() {
        println!("  failed  {error}");
    }
}

fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
