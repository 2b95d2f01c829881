//! Batch generation: every (symbol, trading day) pair becomes one session job.
//!
//! Jobs share nothing but read-only configuration and the provider, and run
//! on a bounded rayon pool. A failing job never produces a file and never
//! stops the other jobs; failures are collected in the summary.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use sessionbars_core::{
    emit_session, run_session, Bar, ClockError, RowAssembler, SessionError,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::calendar::{trading_days, HolidayCalendar, TradingDay};
use crate::config::GenerationConfig;
use crate::output::{plan_output, CsvFileSink, OutputPlan, SinkError};
use crate::provider::{BarProvider, DataError};

/// Errors that stop a generation run before any session is attempted.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("no symbols requested")]
    NoSymbols,

    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Why a single session failed.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error("fetch bars: {0}")]
    Data(#[from] DataError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("write output: {0}")]
    Sink(#[from] SinkError),
}

/// What to generate.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub symbols: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub output_dir: PathBuf,
}

/// One (symbol, trading day) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionJob {
    pub symbol: String,
    pub day: TradingDay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    Written {
        path: PathBuf,
        rows: usize,
        synthesized: usize,
        /// BLAKE3 of the normalized input bars.
        input_hash: String,
    },
    Skipped {
        existing: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub symbol: String,
    pub date: NaiveDate,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionFailure {
    pub symbol: String,
    pub date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationSummary {
    pub completed: Vec<SessionReport>,
    pub failed: Vec<SessionFailure>,
}

impl GenerationSummary {
    pub fn written(&self) -> usize {
        self.completed
            .iter()
            .filter(|r| matches!(r.status, SessionStatus::Written { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.completed.len() - self.written()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Requested symbols without repeats, first occurrence wins.
pub fn unique_symbols(symbols: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    symbols
        .iter()
        .map(String::as_str)
        .filter(|s| seen.insert(*s))
        .collect()
}

/// Expand a request into jobs, symbol-major, in date order.
///
/// A symbol listed twice is planned once; two jobs for the same
/// (symbol, day) would write the same output file.
pub fn plan_jobs(request: &GenerationRequest, calendar: &HolidayCalendar) -> Vec<SessionJob> {
    let days = trading_days(request.start, request.end, calendar);
    unique_symbols(&request.symbols)
        .into_iter()
        .flat_map(|symbol| {
            days.iter().map(move |day| SessionJob {
                symbol: symbol.to_string(),
                day: *day,
            })
        })
        .collect()
}

/// Generate every session in `request`.
pub fn generate(
    request: &GenerationRequest,
    provider: &dyn BarProvider,
    calendar: &HolidayCalendar,
    config: &GenerationConfig,
) -> Result<GenerationSummary, RunError> {
    if request.symbols.is_empty() {
        return Err(RunError::NoSymbols);
    }
    if request.start > request.end {
        return Err(RunError::InvalidRange {
            start: request.start,
            end: request.end,
        });
    }

    let jobs = plan_jobs(request, calendar);
    info!(
        jobs = jobs.len(),
        symbols = unique_symbols(&request.symbols).len(),
        provider = provider.name(),
        workers = config.runner.workers,
        "starting generation"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.runner.workers)
        .build()?;
    let outcomes: Vec<(SessionJob, Result<SessionStatus, JobError>)> = pool.install(|| {
        jobs.into_par_iter()
            .map(|job| {
                let outcome = run_job(&job, provider, config, &request.output_dir);
                (job, outcome)
            })
            .collect()
    });

    let mut summary = GenerationSummary::default();
    for (job, outcome) in outcomes {
        match outcome {
            Ok(status) => summary.completed.push(SessionReport {
                symbol: job.symbol,
                date: job.day.date,
                status,
            }),
            Err(e) => {
                warn!(symbol = %job.symbol, date = %job.day.date, error = %e, "session failed");
                summary.failed.push(SessionFailure {
                    symbol: job.symbol,
                    date: job.day.date,
                    reason: e.to_string(),
                });
            }
        }
    }
    info!(
        written = summary.written(),
        skipped = summary.skipped(),
        failed = summary.failed.len(),
        "generation finished"
    );
    Ok(summary)
}

/// Fetch, compute and write one session.
pub fn run_job(
    job: &SessionJob,
    provider: &dyn BarProvider,
    config: &GenerationConfig,
    output_dir: &Path,
) -> Result<SessionStatus, JobError> {
    let (path, stale) = match plan_output(output_dir, &job.symbol, job.day.date, config.output.version)? {
        OutputPlan::Skip { existing } => {
            info!(symbol = %job.symbol, date = %job.day.date, path = %existing.display(), "session file up to date, skipping");
            return Ok(SessionStatus::Skipped { existing });
        }
        OutputPlan::Write { path, stale } => (path, stale),
    };

    let clock = job.day.clock(&config.session)?;
    let raw = provider.fetch(&job.symbol, clock.start_utc()?, clock.end_utc()?)?;
    let bars: Vec<Bar> = raw.iter().map(|r| r.to_session_bar(&clock)).collect();

    let output = run_session(&clock, &config.indicators, &bars)?;
    let input_hash = bars_hash(&output.bars);

    let assembler = RowAssembler::new(&config.indicators, config.output.decimals);
    let sink = CsvFileSink::create(&path)?;
    emit_session(&assembler, &output.rows, sink)?;

    for old in stale {
        if let Err(e) = std::fs::remove_file(&old) {
            warn!(path = %old.display(), error = %e, "could not remove outdated session file");
        }
    }

    info!(
        symbol = %job.symbol,
        date = %job.day.date,
        rows = output.rows.len(),
        synthesized = output.synthesized(),
        early_close = job.day.early_close,
        synthetic = provider.is_synthetic(),
        "session written"
    );
    Ok(SessionStatus::Written {
        path,
        rows: output.rows.len(),
        synthesized: output.synthesized(),
        input_hash,
    })
}

/// Deterministic BLAKE3 hash over bar timestamps and OHLCV values.
pub fn bars_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.timestamp.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
