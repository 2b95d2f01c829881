//! Exponential Moving Average (EMA).
//!
//! multiplier = smoothing / (period + 1)
//! EMA[t]     = close[t] * multiplier + EMA[t-1] * (1 - multiplier)
//! Seed: simple average of the first `period` values.

use super::sma::mean;

/// Smoothing multiplier for an EMA of `period`.
pub fn ema_multiplier(smoothing: f64, period: usize) -> f64 {
    smoothing / (period as f64 + 1.0)
}

/// Running EMA value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ema {
    period: usize,
    multiplier: f64,
    value: f64,
}

impl Ema {
    /// Seed from exactly `period` trailing values (their simple average).
    ///
    /// Returns `None` when `window` is not `period` long or `period` is zero.
    pub fn seed(period: usize, smoothing: f64, window: &[f64]) -> Option<Self> {
        if period == 0 || window.len() != period {
            return None;
        }
        Some(Self {
            period,
            multiplier: ema_multiplier(smoothing, period),
            value: mean(window)?,
        })
    }

    /// Fold the next value into the average and return the new EMA.
    pub fn update(&mut self, value: f64) -> f64 {
        self.value = value * self.multiplier + self.value * (1.0 - self.multiplier);
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn multiplier_for_standard_periods() {
        assert_approx(ema_multiplier(2.0, 12), 2.0 / 13.0, DEFAULT_EPSILON);
        assert_approx(ema_multiplier(2.0, 26), 2.0 / 27.0, DEFAULT_EPSILON);
        assert_approx(ema_multiplier(2.0, 9), 0.2, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_3_known_values() {
        // Closes: 10, 11, 12, then 13, 14
        // multiplier = 2/(3+1) = 0.5
        // Seed: SMA(10,11,12) = 11.0
        // EMA = 0.5*13 + 0.5*11.0 = 12.0
        // EMA = 0.5*14 + 0.5*12.0 = 13.0
        let mut ema = Ema::seed(3, 2.0, &[10.0, 11.0, 12.0]).unwrap();
        assert_approx(ema.value(), 11.0, DEFAULT_EPSILON);
        assert_approx(ema.update(13.0), 12.0, DEFAULT_EPSILON);
        assert_approx(ema.update(14.0), 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn flat_series_stays_flat() {
        let mut ema = Ema::seed(26, 2.0, &[42.5; 26]).unwrap();
        for _ in 0..50 {
            assert_approx(ema.update(42.5), 42.5, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn custom_smoothing_changes_multiplier() {
        let ema = Ema::seed(4, 1.0, &[1.0; 4]).unwrap();
        assert_approx(ema.multiplier(), 0.2, DEFAULT_EPSILON);
    }

    #[test]
    fn seed_requires_exact_window() {
        assert!(Ema::seed(3, 2.0, &[1.0, 2.0]).is_none());
        assert!(Ema::seed(3, 2.0, &[1.0, 2.0, 3.0, 4.0]).is_none());
        assert!(Ema::seed(0, 2.0, &[]).is_none());
    }
}
