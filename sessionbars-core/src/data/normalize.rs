//! Bar continuity normalizer.
//!
//! Providers only emit a bar for minutes with trading activity. Downstream
//! indicators need exactly one bar per session minute, so the normalizer
//! computes the full minute timeline from the session clock up front and maps
//! every raw bar onto its slot by timestamp. Empty slots are filled with a
//! flat, zero-volume bar priced at the preceding close.
//!
//! The first raw bar must sit exactly on the session start. A missing opening
//! minute means there is no preceding close to repair from, which points at an
//! upstream data defect rather than a quiet minute.

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::Bar;
use crate::session::SessionClock;

/// Fatal integrity violations in a session's bar sequence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("no bars supplied for session starting {start}")]
    Empty { start: NaiveDateTime },

    #[error("first bar at {actual} does not match session start {expected}")]
    MisalignedStart {
        expected: NaiveDateTime,
        actual: NaiveDateTime,
    },

    #[error("bar at {timestamp} is not on a minute boundary")]
    Unaligned { timestamp: NaiveDateTime },

    #[error("bar at {timestamp} follows later bar at {previous}")]
    OutOfOrder {
        previous: NaiveDateTime,
        timestamp: NaiveDateTime,
    },

    #[error("duplicate bar at {timestamp}")]
    Duplicate { timestamp: NaiveDateTime },

    #[error("dense series has {actual} bars, session has {expected} minutes")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("dense series breaks at index {index}: expected {expected}, found {actual}")]
    Discontinuity {
        index: usize,
        expected: NaiveDateTime,
        actual: NaiveDateTime,
    },
}

/// A run of consecutive minutes that had no raw bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapRepair {
    /// First missing minute.
    pub start: NaiveDateTime,
    /// Number of consecutive minutes synthesized.
    pub minutes: usize,
}

/// Dense, one-bar-per-minute session series plus a record of what was repaired.
#[derive(Debug, Clone)]
pub struct NormalizedSession {
    pub bars: Vec<Bar>,
    pub gaps: Vec<GapRepair>,
    /// Raw bars after the session end that were discarded.
    pub dropped: usize,
}

impl NormalizedSession {
    /// Total number of synthesized bars.
    pub fn synthesized(&self) -> usize {
        self.gaps.iter().map(|g| g.minutes).sum()
    }
}

/// Normalize `raw` onto the minute timeline of `clock`.
///
/// `raw` must be in strictly increasing timestamp order with every bar on a
/// whole minute. Bars after the session end are dropped.
pub fn normalize(raw: &[Bar], clock: &SessionClock) -> Result<NormalizedSession, NormalizeError> {
    let first = raw.first().ok_or(NormalizeError::Empty {
        start: clock.start(),
    })?;
    if first.timestamp != clock.start() {
        return Err(NormalizeError::MisalignedStart {
            expected: clock.start(),
            actual: first.timestamp,
        });
    }

    let minutes = clock.minute_count();
    let mut slots: Vec<Option<&Bar>> = vec![None; minutes];
    let mut previous: Option<NaiveDateTime> = None;
    let mut dropped = 0;

    for bar in raw {
        if !bar.is_minute_aligned() {
            return Err(NormalizeError::Unaligned {
                timestamp: bar.timestamp,
            });
        }
        if let Some(prev) = previous {
            if bar.timestamp == prev {
                return Err(NormalizeError::Duplicate {
                    timestamp: bar.timestamp,
                });
            }
            if bar.timestamp < prev {
                return Err(NormalizeError::OutOfOrder {
                    previous: prev,
                    timestamp: bar.timestamp,
                });
            }
        }
        previous = Some(bar.timestamp);
        if !bar.is_sane() {
            warn!(timestamp = %bar.timestamp, "bar fails OHLC sanity check");
        }

        match clock.offset_of(bar.timestamp) {
            Some(offset) => slots[offset] = Some(bar),
            None => {
                debug!(timestamp = %bar.timestamp, end = %clock.end(), "dropping bar past session end");
                dropped += 1;
            }
        }
    }

    let mut bars: Vec<Bar> = Vec::with_capacity(minutes);
    let mut gaps: Vec<GapRepair> = Vec::new();
    let mut open_gap: Option<GapRepair> = None;

    for (offset, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(bar) => {
                if let Some(gap) = open_gap.take() {
                    gaps.push(gap);
                }
                bars.push(bar.clone());
            }
            None => {
                // Slot 0 is always filled, so a preceding bar exists.
                let prev_close = bars[offset - 1].close;
                let timestamp = clock.timestamp_at(offset);
                bars.push(Bar::flat(timestamp, prev_close));
                match open_gap.as_mut() {
                    Some(gap) => gap.minutes += 1,
                    None => {
                        open_gap = Some(GapRepair {
                            start: timestamp,
                            minutes: 1,
                        })
                    }
                }
            }
        }
    }
    if let Some(gap) = open_gap {
        gaps.push(gap);
    }

    for gap in &gaps {
        info!(start = %gap.start, minutes = gap.minutes, "repaired missing minutes");
    }

    Ok(NormalizedSession {
        bars,
        gaps,
        dropped,
    })
}

/// Check that `bars` is exactly the dense minute series of `clock`.
pub fn verify_dense(bars: &[Bar], clock: &SessionClock) -> Result<(), NormalizeError> {
    let expected_len = clock.minute_count();
    if bars.len() != expected_len {
        return Err(NormalizeError::LengthMismatch {
            expected: expected_len,
            actual: bars.len(),
        });
    }
    for (index, (bar, expected)) in bars.iter().zip(clock.timeline()).enumerate() {
        if bar.timestamp != expected {
            return Err(NormalizeError::Discontinuity {
                index,
                expected,
                actual: bar.timestamp,
            });
        }
    }
    Ok(())
}
