//! SessionBars Runner — scheduling, bar sourcing and session file output.
//!
//! This crate builds on `sessionbars-core` to provide:
//! - TOML generation config (session window, indicators, output, workers)
//! - Holiday calendar and trading-day scheduling
//! - Bar providers (CSV directory, deterministic synthetic)
//! - Versioned session file naming and an all-or-nothing CSV sink
//! - Parallel batch generation over (symbol, day) pairs

pub mod calendar;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod provider;

pub use calendar::{trading_days, CalendarError, Holiday, HolidayCalendar, TradingDay};
pub use config::{ConfigError, GenerationConfig, OutputConfig, RunnerConfig};
pub use output::{
    plan_output, session_file_name, session_path, CsvFileSink, OutputPlan, SinkError,
};
pub use pipeline::{
    generate, plan_jobs, run_job, unique_symbols, GenerationRequest, GenerationSummary, JobError,
    RunError, SessionFailure, SessionJob, SessionReport, SessionStatus,
};
pub use provider::{BarProvider, CsvDirProvider, DataError, RawBar, SyntheticProvider};
