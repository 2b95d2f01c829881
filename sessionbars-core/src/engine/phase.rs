//! Warm-up phase keyed on elapsed minutes since session start.

use serde::{Deserialize, Serialize};

use crate::session::Anchors;

/// Where a given minute sits in the session's warm-up schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Before warm-up start: history only.
    PreWarmup,
    /// The warm-up start minute: EMAs and Wilder averages are seeded.
    Seed,
    /// Between warm-up start and signal warm-up: MACD history grows.
    Accumulate,
    /// The signal warm-up minute: MACD signal is seeded.
    SignalSeed,
    /// Every minute after signal warm-up.
    Steady,
}

impl Phase {
    /// Phase of the minute at `offset`.
    pub fn at(offset: usize, anchors: &Anchors) -> Self {
        if offset < anchors.warmup_start {
            Phase::PreWarmup
        } else if offset == anchors.warmup_start {
            Phase::Seed
        } else if offset < anchors.signal_warmup {
            Phase::Accumulate
        } else if offset == anchors.signal_warmup {
            Phase::SignalSeed
        } else {
            Phase::Steady
        }
    }

    /// Whether a row is emitted for minutes in this phase.
    pub fn emits(self) -> bool {
        !matches!(self, Phase::PreWarmup | Phase::Seed)
    }

    /// Whether the MACD value of this minute joins the signal seed history.
    pub fn collects_macd(self) -> bool {
        matches!(self, Phase::Seed | Phase::Accumulate | Phase::SignalSeed)
    }
}
