//! SessionBars CLI — generate indicator session files.
//!
//! Commands:
//! - `generate` — build `SYMBOL/SYMBOL_YYYYMMDD_vNNN.csv` for every trading day in a range
//! - `days` — list the trading days (and early closes) a range would generate

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sessionbars_runner::{
    generate, trading_days, BarProvider, CsvDirProvider, GenerationConfig, GenerationRequest,
    HolidayCalendar, SyntheticProvider,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sessionbars",
    about = "SessionBars — gap-free minute bars with session-anchored indicators"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Range {
    /// Start date, inclusive (YYYYMMDD).
    #[arg(short = 's', long = "start", value_parser = parse_date)]
    start: NaiveDate,

    /// End date, inclusive (YYYYMMDD). Defaults to today.
    #[arg(short = 'e', long = "end", value_parser = parse_date)]
    end: Option<NaiveDate>,

    /// Market holiday calendar (JSON keyed by year).
    #[arg(long)]
    holidays: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate session files for every symbol and trading day in the range.
    Generate {
        /// Comma-separated symbols (e.g. AAPL,TSLA).
        #[arg(short = 't', long = "tickers", value_delimiter = ',', required = true)]
        tickers: Vec<String>,

        #[command(flatten)]
        range: Range,

        /// TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of `<SYMBOL>.csv` minute bar files.
        #[arg(long, conflicts_with = "synthetic")]
        bars_dir: Option<PathBuf>,

        /// Use deterministic synthetic bars instead of real data.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Override `runner.workers` from the config.
        #[arg(long)]
        workers: Option<usize>,

        /// Output root directory.
        #[arg(default_value = "output")]
        output_dir: PathBuf,
    },
    /// Print the trading days a range covers.
    Days {
        #[command(flatten)]
        range: Range,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|e| format!("expected YYYYMMDD: {e}"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            tickers,
            range,
            config,
            bars_dir,
            synthetic,
            workers,
            output_dir,
        } => run_generate(tickers, range, config, bars_dir, synthetic, workers, output_dir),
        Commands::Days { range } => run_days(range),
    }
}

fn resolve_range(range: &Range) -> Result<(NaiveDate, NaiveDate, HolidayCalendar)> {
    let end = range
        .end
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    if range.start > end {
        bail!("start date {} is after end date {end}", range.start);
    }
    let calendar = match &range.holidays {
        Some(path) => HolidayCalendar::from_file(path)
            .with_context(|| format!("loading holidays from {}", path.display()))?,
        None => HolidayCalendar::default(),
    };
    Ok((range.start, end, calendar))
}

fn run_generate(
    tickers: Vec<String>,
    range: Range,
    config_path: Option<PathBuf>,
    bars_dir: Option<PathBuf>,
    synthetic: bool,
    workers: Option<usize>,
    output_dir: PathBuf,
) -> Result<()> {
    let symbols: Vec<String> = tickers
        .iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect();
    if symbols.is_empty() {
        bail!("no symbols given (use -t AAPL,TSLA)");
    }

    let mut config = match &config_path {
        Some(path) => GenerationConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GenerationConfig::default(),
    };
    if let Some(n) = workers {
        config.runner.workers = n;
        config.validate()?;
    }

    let (start, end, calendar) = resolve_range(&range)?;

    let provider: Box<dyn BarProvider> = match (bars_dir, synthetic) {
        (Some(dir), false) => Box::new(CsvDirProvider::new(dir)),
        (None, true) => Box::new(SyntheticProvider::default()),
        _ => bail!("one of --bars-dir or --synthetic is required"),
    };

    let request = GenerationRequest {
        symbols,
        start,
        end,
        output_dir,
    };
    let summary = generate(&request, provider.as_ref(), &calendar, &config)?;

    for failure in &summary.failed {
        eprintln!("FAILED {} {}: {}", failure.symbol, failure.date, failure.reason);
    }
    println!(
        "written {}, skipped {}, failed {}",
        summary.written(),
        summary.skipped(),
        summary.failed.len()
    );
    info!(output = %request.output_dir.display(), "done");

    if !summary.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_days(range: Range) -> Result<()> {
    let (start, end, calendar) = resolve_range(&range)?;
    let days = trading_days(start, end, &calendar);
    for day in &days {
        if day.early_close {
            println!("{} early-close", day.date.format("%Y%m%d"));
        } else {
            println!("{}", day.date.format("%Y%m%d"));
        }
    }
    info!(count = days.len(), "trading days listed");
    Ok(())
}
