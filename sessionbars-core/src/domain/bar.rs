//! Bar — one minute of market data.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol and a single minute.
///
/// `timestamp` is the session-local wall-clock minute the bar opens at.
/// Provider timestamps are converted into the session zone before a `Bar`
/// is built, so the core never deals with offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// A flat, zero-volume bar used to fill a minute with no trading activity.
    ///
    /// All four prices equal `price` (the preceding bar's close).
    pub fn flat(timestamp: NaiveDateTime, price: f64) -> Self {
        Self {
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0,
        }
    }

    /// Typical price used by VWAP: (high + low + close) / 3.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// True when the timestamp sits exactly on a minute boundary.
    pub fn is_minute_aligned(&self) -> bool {
        self.timestamp.second() == 0 && self.timestamp.nanosecond() == 0
    }

    /// True for a gap-fill bar: zero volume and a single price.
    pub fn is_flat(&self) -> bool {
        self.volume == 0
            && self.open == self.close
            && self.high == self.close
            && self.low == self.close
    }
}
