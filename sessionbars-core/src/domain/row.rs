//! IndicatorRow — one fully computed minute, as produced by the engine.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Bar;

/// Engine output for a single emitted minute.
///
/// Optional fields are absent when the value is not defined at that minute:
/// `vwap` before any volume has traded since the last VWAP anchor, and
/// `macd_signal` before the signal line has been seeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    /// Elapsed minutes since session start.
    pub offset: usize,
    pub bar: Bar,
    pub vwap: Option<f64>,
    /// Short, medium and long SMA, in the configured period order.
    pub sma: [f64; 3],
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub macd: f64,
    pub macd_signal: Option<f64>,
    pub rsi: f64,
}

impl IndicatorRow {
    pub fn timestamp(&self) -> NaiveDateTime {
        self.bar.timestamp
    }
}
