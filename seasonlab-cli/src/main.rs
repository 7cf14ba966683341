//! SeasonLab CLI — ingest and status commands.
//!
//! Commands:
//! - `ingest` — read a CSV of OHLCV rows and (re)calculate seasonality
//!   tables for every symbol it contains
//! - `status` — report what the store holds per symbol

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use seasonlab_core::domain::Timeframe;
use seasonlab_core::ingest::RawTable;
use seasonlab_core::progress::StdoutProgress;
use seasonlab_core::store::SeasonalStore;
use seasonlab_runner::{run_batch, BatchOptions, BatchReport, JsonStore, RunnerConfig};

#[derive(Parser)]
#[command(
    name = "seasonlab",
    about = "SeasonLab CLI — seasonality calculation engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a CSV file and recalculate seasonality tables.
    Ingest {
        /// Path to the CSV file.
        file: PathBuf,

        /// Symbol for files without a symbol column.
        #[arg(long)]
        symbol: Option<String>,

        /// Force a full recalculation even when an incremental one would do.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Run symbols sequentially instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Optional TOML config file. Flags override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Store directory. Defaults to the config's data_dir (./data).
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Print the full report as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Report stored symbols, row counts, and latest dates.
    Status {
        /// Limit to one symbol.
        #[arg(long)]
        symbol: Option<String>,

        /// Store directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest {
            file,
            symbol,
            force,
            sequential,
            config,
            data_dir,
            json,
        } => run_ingest(&file, symbol, force, sequential, config, data_dir, json),
        Commands::Status { symbol, data_dir } => run_status(&data_dir, symbol.as_deref()),
    }
}

fn run_ingest(
    file: &Path,
    symbol: Option<String>,
    force: bool,
    sequential: bool,
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let cfg = match config {
        Some(path) => RunnerConfig::load(&path)?,
        None => RunnerConfig::default(),
    };

    let table = read_csv(file)?;
    let store = JsonStore::new(resolve_data_dir(data_dir, &cfg));
    let opts = BatchOptions {
        default_symbol: symbol,
        row_error_limit: cfg.row_error_limit,
        chunk_size: cfg.chunk_size,
        lookback_months: cfg.lookback_months,
        force,
        parallel: cfg.parallel && !sequential,
    };

    let report = run_batch(&table, &opts, &store, &StdoutProgress, None)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    if !report.failed.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

/// The `--data-dir` flag wins; otherwise the config's `data_dir` applies.
fn resolve_data_dir(flag: Option<PathBuf>, cfg: &RunnerConfig) -> PathBuf {
    flag.unwrap_or_else(|| cfg.data_dir.clone())
}

fn read_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open '{}'", path.display()))?;

    let headers = reader
        .headers()
        .context("failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.context("failed to read CSV record")?;
        records.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable { headers, records })
}

fn print_summary(report: &BatchReport) {
    println!(
        "rows: {}/{} usable, dataset {}",
        report.rows_used, report.rows_read, &report.dataset_hash[..12]
    );
    for outcome in &report.outcomes {
        let written: u64 = outcome.derived_counts.values().sum();
        println!(
            "  {} — {:?} ({}): {} rows written ({} new, {} updated)",
            outcome.symbol, outcome.mode, outcome.reason, written, outcome.inserted,
            outcome.updated
        );
    }
    for failure in &report.failed {
        eprintln!("  {} — FAILED: {}", failure.symbol, failure.error);
    }
    for err in &report.row_errors {
        eprintln!(
            "  skipped row {} ({}): {}",
            err.line,
            err.symbol.as_deref().unwrap_or("?"),
            err.message
        );
    }
    if report.cancelled {
        println!("  (cancelled before all symbols ran)");
    }
}

fn run_status(data_dir: &Path, only: Option<&str>) -> Result<()> {
    let store = JsonStore::new(data_dir);
    let symbols = store.symbols()?;

    if symbols.is_empty() {
        println!("store at '{}' is empty", data_dir.display());
        return Ok(());
    }

    for symbol in symbols {
        if only.is_some_and(|s| s != symbol) {
            continue;
        }
        let latest = store
            .latest_date(&symbol)?
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        print!("{symbol}: latest {latest}");
        for tf in Timeframe::ALL {
            let count = store.count_rows(&symbol, tf)?;
            print!(", {} {}", count, tf.as_str());
        }
        println!();
    }
    Ok(())
}
