//! Daybound CLI — exit boundaries, train/out-of-sample classification and
//! batch runs of the delayed-entry engine.
//!
//! Commands:
//! - `boundary` — print the exit boundary of one entry instant
//! - `classify` — split a row file into train / out-of-sample / excluded
//! - `run` — evaluate a row file against a candle snapshot and save artifacts

mod logging;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use tracing::info;

use daybound_core::{CalendarConfig, Classifier, SessionCalendar, TrainCutoff};
use daybound_runner::{
    load_candles, load_rows, load_rows_with, run_batch, save_artifacts, RowLoadOptions, RunConfig,
};

#[derive(Parser)]
#[command(
    name = "daybound",
    about = "Daybound CLI — leakage-safe day-trade boundaries and delayed entries"
)]
struct Cli {
    /// Log level filter (overridden by RUST_LOG).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the exit boundary of an entry instant.
    Boundary {
        /// Entry instant, RFC 3339 (e.g., 2024-01-05T14:30:00Z).
        #[arg(long)]
        entry: String,

        /// Optional run config; only its [calendar] table is used.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Classify every row of a signal file.
    Classify {
        /// Path to a TOML run config.
        #[arg(long)]
        config: PathBuf,

        /// Signal rows CSV.
        #[arg(long)]
        rows: PathBuf,

        /// Derive the cutoff from the last training entry instead of [split].
        #[arg(long)]
        last_train_entry: Option<String>,
    },
    /// Evaluate a signal file against a candle snapshot.
    Run {
        /// Path to a TOML run config.
        #[arg(long)]
        config: PathBuf,

        /// Fine-grained candle snapshot CSV.
        #[arg(long)]
        candles: PathBuf,

        /// Signal rows CSV.
        #[arg(long)]
        rows: PathBuf,

        /// Symbol of the snapshot.
        #[arg(long, default_value = "SPY")]
        symbol: String,

        /// Candle interval in minutes.
        #[arg(long, default_value_t = 1)]
        interval_minutes: i64,

        /// Output directory for rows.csv and manifest.json.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(&cli.log_level, cli.json);

    match cli.command {
        Commands::Boundary { entry, config } => cmd_boundary(&entry, config.as_deref()),
        Commands::Classify {
            config,
            rows,
            last_train_entry,
        } => cmd_classify(&config, &rows, last_train_entry.as_deref()),
        Commands::Run {
            config,
            candles,
            rows,
            symbol,
            interval_minutes,
            output_dir,
        } => cmd_run(
            &config,
            &candles,
            &rows,
            &symbol,
            interval_minutes,
            &output_dir,
        ),
    }
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("invalid RFC 3339 instant '{value}'"))?;
    Ok(parsed.with_timezone(&Utc))
}

fn cmd_boundary(entry: &str, config: Option<&Path>) -> Result<()> {
    let calendar_config = match config {
        Some(path) => RunConfig::from_file(path)?.calendar,
        None => CalendarConfig::default(),
    };
    let calendar = SessionCalendar::from_config(&calendar_config)?;
    let boundary = calendar.compute_exit_boundary(parse_instant(entry)?);

    println!("entry: {}", boundary.entry_utc.to_rfc3339());
    match boundary.exit_utc {
        Some(exit) => println!("exit:  {}", exit.to_rfc3339()),
        None => println!("exit:  undefined (entry on a non-trading day)"),
    }
    Ok(())
}

fn cmd_classify(config: &Path, rows: &Path, last_train_entry: Option<&str>) -> Result<()> {
    let config = RunConfig::from_file(config)?;
    let calendar = config.session_calendar()?;
    let cutoff = match last_train_entry {
        Some(entry) => match TrainCutoff::from_last_train_entry(&calendar, parse_instant(entry)?) {
            Some(cutoff) => cutoff,
            None => bail!("last training entry {entry} falls on a non-trading day"),
        },
        None => config.train_cutoff(),
    };
    let classifier = Classifier::new(calendar, cutoff);

    // Splitting needs only ids and entry times; scores may be absent.
    let rows = load_rows_with(
        rows,
        RowLoadOptions {
            require_scores: false,
        },
    )?;
    let partition = classifier.partition(rows.iter().map(|r| (r.row.id, r.row.entry_utc)));
    info!(
        cutoff = %cutoff.instant(),
        train = partition.train.len(),
        out_of_sample = partition.out_of_sample.len(),
        excluded = partition.excluded.len(),
        "classified rows"
    );

    println!("{}", serde_json::to_string_pretty(&partition)?);
    Ok(())
}

fn cmd_run(
    config: &Path,
    candles: &Path,
    rows: &Path,
    symbol: &str,
    interval_minutes: i64,
    output_dir: &Path,
) -> Result<()> {
    if interval_minutes <= 0 {
        bail!("--interval-minutes must be positive");
    }
    let config = RunConfig::from_file(config)?;
    let series = load_candles(candles, symbol, Duration::minutes(interval_minutes))?;
    let rows = load_rows(rows)?;

    let result = run_batch(&config, &series, &rows)?;
    save_artifacts(&result, output_dir)?;

    println!("run id:  {}", result.run_id);
    println!("digest:  {}", result.digest);
    println!(
        "rows:    {} (train {}, out-of-sample {}, excluded {})",
        result.summary.total,
        result.partition.train.len(),
        result.partition.out_of_sample.len(),
        result.partition.excluded.len()
    );
    println!("executed: {}", result.summary.executed());
    println!("artifacts: {}", output_dir.display());
    Ok(())
}
