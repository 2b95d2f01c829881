//! Relative Strength Index (RSI), Wilder's method.
//!
//! Seed: average gain and average loss are the means of the positive and
//! negative close-to-close deltas over the trailing `period` minutes.
//! Then, for each new delta:
//!   avg = (prev_avg * (period - 1) + current) / period
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Edge cases: avg_loss == 0 → RSI = 100; both averages zero → RSI = 50.

/// Running Wilder averages for one RSI period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WilderRsi {
    period: usize,
    avg_gain: f64,
    avg_loss: f64,
}

impl WilderRsi {
    /// Seed from the trailing `period + 1` closes (yielding `period` deltas).
    ///
    /// Returns `None` when `closes` is not exactly `period + 1` long or
    /// `period` is zero.
    pub fn seed(period: usize, closes: &[f64]) -> Option<Self> {
        if period == 0 || closes.len() != period + 1 {
            return None;
        }
        let (gains, losses) = closes
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold((0.0_f64, 0.0_f64), |(g, l), delta| {
                if delta > 0.0 {
                    (g + delta, l)
                } else {
                    (g, l - delta)
                }
            });
        let period_f = period as f64;
        Some(Self {
            period,
            avg_gain: gains / period_f,
            avg_loss: losses / period_f,
        })
    }

    /// Apply Wilder smoothing with the latest close-to-close delta.
    pub fn update(&mut self, delta: f64) -> f64 {
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { -delta } else { 0.0 };
        let period_f = self.period as f64;
        self.avg_gain = (self.avg_gain * (period_f - 1.0) + gain) / period_f;
        self.avg_loss = (self.avg_loss * (period_f - 1.0) + loss) / period_f;
        self.value()
    }

    pub fn value(&self) -> f64 {
        rsi_from_averages(self.avg_gain, self.avg_loss)
    }

    pub fn avg_gain(&self) -> f64 {
        self.avg_gain
    }

    pub fn avg_loss(&self) -> f64 {
        self.avg_loss
    }
}

/// Convert average gain / average loss into an RSI value in [0, 100].
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // no movement
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
