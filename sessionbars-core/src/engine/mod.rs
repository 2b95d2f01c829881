//! Indicator engine — minute-by-minute state machine over a dense session.
//!
//! The engine consumes the normalized minute series in order and moves
//! through five phases keyed on the elapsed-minute offset from session start:
//!
//! 1. PreWarmup: closes feed the rolling history only
//! 2. Seed: EMA fast/slow and Wilder averages seeded from trailing windows
//! 3. Accumulate: smoothing updates, MACD history grows, rows emitted
//! 4. SignalSeed: MACD signal seeded from the collected MACD history
//! 5. Steady: every indicator updated each minute, rows emitted

pub mod computation;
pub mod config;
pub mod phase;
pub mod pipeline;
pub mod state;

pub use computation::{compute_session, SessionComputation};
pub use config::IndicatorConfig;
pub use phase::Phase;
pub use pipeline::{run_session, SessionError, SessionOutput};
pub use state::IndicatorState;

use thiserror::Error;

use crate::data::NormalizeError;

/// Fatal errors for one session's indicator computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid indicator configuration: {0}")]
    InvalidConfig(String),

    #[error("warm-up starts at +{warmup_start} min but seeding needs {needed} bars of history")]
    InsufficientHistory { warmup_start: usize, needed: usize },

    #[error(
        "signal warm-up at +{signal_warmup} min does not collect {signal_period} MACD values from warm-up at +{warmup_start} min"
    )]
    InconsistentSchedule {
        warmup_start: usize,
        signal_warmup: usize,
        signal_period: usize,
    },

    #[error("malformed dense series: {0}")]
    Malformed(#[from] NormalizeError),

    #[error("bar at {actual} arrived where minute {expected} (+{offset}) was expected")]
    UnexpectedMinute {
        offset: usize,
        expected: chrono::NaiveDateTime,
        actual: chrono::NaiveDateTime,
    },

    #[error("bar received after the session's final minute")]
    PastSessionEnd,

    #[error("session ended after {consumed} of {expected} minutes")]
    Incomplete { consumed: usize, expected: usize },
}
