//! Volume-Weighted Average Price (VWAP).
//!
//! VWAP = sum(typical_price * volume) / sum(volume), typical = (h + l + c) / 3.
//! The accumulator can be re-based on a single bar, which is how the engine
//! restarts VWAP at the official market open.

use crate::domain::Bar;

/// Cumulative price-volume and volume sums.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vwap {
    price_volume: f64,
    volume: u64,
}

impl Vwap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one bar's contribution.
    pub fn add(&mut self, bar: &Bar) {
        self.price_volume += bar.typical_price() * bar.volume as f64;
        self.volume += bar.volume;
    }

    /// Discard everything accumulated so far and keep only `bar`'s contribution.
    pub fn reset_to(&mut self, bar: &Bar) {
        *self = Self::default();
        self.add(bar);
    }

    /// Current VWAP, or `None` while no volume has been accumulated.
    pub fn value(&self) -> Option<f64> {
        if self.volume == 0 {
            None
        } else {
            Some(self.price_volume / self.volume as f64)
        }
    }

    pub fn cumulative_volume(&self) -> u64 {
        self.volume
    }

    pub fn cumulative_price_volume(&self) -> f64 {
        self.price_volume
    }
}
