//! SessionBars Core — session clock, bar continuity, streaming indicators, row assembly.
//!
//! This crate contains the algorithmic heart of session file generation:
//! - Domain types (minute bars, computed indicator rows)
//! - Session clock with named anchor offsets (warm-up, signal warm-up, market open)
//! - Bar continuity normalizer that turns sparse provider bars into a dense minute series
//! - Incremental indicator primitives (EMA, SMA, Wilder RSI, VWAP)
//! - Phase-driven indicator engine that consumes one minute at a time
//! - Row assembler mapping engine output onto the fixed 15-column schema
//!
//! The crate performs no I/O. Bar sourcing and persistence live behind
//! traits implemented by `sessionbars-runner`.

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod output;
pub mod session;

pub use data::{normalize, verify_dense, GapRepair, NormalizeError, NormalizedSession};
pub use domain::{Bar, IndicatorRow};
pub use engine::{
    compute_session, run_session, EngineError, IndicatorConfig, Phase, SessionComputation,
    SessionError, SessionOutput,
};
pub use output::{emit_session, OutputRow, RowAssembler, RowSink, VecSink};
pub use session::{Anchors, ClockError, SessionClock, SessionConfig};
