//! One session end to end: normalize the raw bars, then run the engine.

use thiserror::Error;
use tracing::info;

use super::{compute_session, EngineError, IndicatorConfig};
use crate::data::{normalize, GapRepair, NormalizeError};
use crate::domain::{Bar, IndicatorRow};
use crate::session::SessionClock;

/// Why a session produced no output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Computed rows plus what the normalizer had to repair to get them.
#[derive(Debug, Clone)]
pub struct SessionOutput {
    /// The dense, gap-filled minute series the rows were computed from.
    pub bars: Vec<Bar>,
    pub rows: Vec<IndicatorRow>,
    pub gaps: Vec<GapRepair>,
    pub dropped: usize,
}

impl SessionOutput {
    pub fn synthesized(&self) -> usize {
        self.gaps.iter().map(|g| g.minutes).sum()
    }
}

/// Normalize `raw` onto the session timeline and compute its rows.
pub fn run_session(
    clock: &SessionClock,
    config: &IndicatorConfig,
    raw: &[Bar],
) -> Result<SessionOutput, SessionError> {
    let normalized = normalize(raw, clock)?;
    let rows = compute_session(clock, config, &normalized.bars)?;
    info!(
        date = %clock.date(),
        rows = rows.len(),
        synthesized = normalized.synthesized(),
        dropped = normalized.dropped,
        "session computed"
    );
    Ok(SessionOutput {
        bars: normalized.bars,
        rows,
        gaps: normalized.gaps,
        dropped: normalized.dropped,
    })
}
