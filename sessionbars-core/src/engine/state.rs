//! Per-session indicator state, created at the seed minute.

use super::{EngineError, IndicatorConfig, Phase};
use crate::indicators::{mean, Ema, WilderRsi};

/// Mutable accumulators owned by exactly one session computation.
///
/// Created at warm-up start, advanced once per following minute, dropped at
/// session end. Never shared and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorState {
    pub ema_fast: Ema,
    pub ema_slow: Ema,
    /// MACD values from the seed minute through signal warm-up.
    pub macd_history: Vec<f64>,
    pub macd_signal: Option<Ema>,
    pub rsi: WilderRsi,
}

impl IndicatorState {
    /// Seed every accumulator from the close history ending at the seed minute.
    ///
    /// `warmup_start` is the seed minute's offset, reported on failure.
    pub fn seed(
        history: &[f64],
        warmup_start: usize,
        config: &IndicatorConfig,
    ) -> Result<Self, EngineError> {
        let needed = config.seed_history();
        let len = history.len();
        let insufficient = || EngineError::InsufficientHistory {
            warmup_start,
            needed,
        };
        if len < needed {
            return Err(insufficient());
        }
        let ema_fast = Ema::seed(config.ema_fast, config.smoothing, &history[len - config.ema_fast..])
            .ok_or_else(insufficient)?;
        let ema_slow = Ema::seed(config.ema_slow, config.smoothing, &history[len - config.ema_slow..])
            .ok_or_else(insufficient)?;
        let rsi = WilderRsi::seed(config.rsi_period, &history[len - (config.rsi_period + 1)..])
            .ok_or_else(insufficient)?;

        let mut macd_history = Vec::with_capacity(config.signal_period);
        macd_history.push(ema_fast.value() - ema_slow.value());

        Ok(Self {
            ema_fast,
            ema_slow,
            macd_history,
            macd_signal: None,
            rsi,
        })
    }

    /// Advance one minute past the seed with `close` and its delta from the previous close.
    pub fn advance(&mut self, close: f64, delta: f64, phase: Phase, config: &IndicatorConfig) {
        let macd = self.ema_fast.update(close) - self.ema_slow.update(close);

        if phase.collects_macd() {
            self.macd_history.push(macd);
        }
        match phase {
            Phase::SignalSeed => {
                let from = self.macd_history.len().saturating_sub(config.signal_period);
                let window = &self.macd_history[from..];
                self.macd_signal = Ema::seed(config.signal_period, config.smoothing, window);
            }
            Phase::Steady => {
                if let Some(signal) = self.macd_signal.as_mut() {
                    signal.update(macd);
                }
            }
            _ => {}
        }

        self.rsi.update(delta);
    }

    pub fn macd(&self) -> f64 {
        self.ema_fast.value() - self.ema_slow.value()
    }

    pub fn macd_signal(&self) -> Option<f64> {
        self.macd_signal.map(|s| s.value())
    }

    /// Mean of the collected MACD history (the signal seed, once complete).
    pub fn macd_history_mean(&self) -> Option<f64> {
        mean(&self.macd_history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn flat_history_seeds_zero_macd() {
        let config = IndicatorConfig::default();
        let state = IndicatorState::seed(&[50.0; 26], 30, &config).unwrap();
        assert_approx(state.ema_fast.value(), 50.0, DEFAULT_EPSILON);
        assert_approx(state.ema_slow.value(), 50.0, DEFAULT_EPSILON);
        assert_eq!(state.macd_history, vec![0.0]);
        assert!(state.macd_signal().is_none());
    }

    #[test]
    fn seed_uses_trailing_windows() {
        let config = IndicatorConfig::default();
        let history: Vec<f64> = (1..=31).map(|i| i as f64).collect();
        let state = IndicatorState::seed(&history, 30, &config).unwrap();
        // Fast: mean(20..=31) = 25.5, slow: mean(6..=31) = 18.5
        assert_approx(state.ema_fast.value(), 25.5, DEFAULT_EPSILON);
        assert_approx(state.ema_slow.value(), 18.5, DEFAULT_EPSILON);
        assert_approx(state.macd(), 7.0, DEFAULT_EPSILON);
        assert_eq!(state.rsi.avg_loss(), 0.0);
        assert_approx(state.rsi.avg_gain(), 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn seed_rejects_short_history() {
        let config = IndicatorConfig::default();
        // A capped rolling history must not be mistaken for the anchor offset.
        assert_eq!(
            IndicatorState::seed(&[1.0; 25], 30, &config),
            Err(EngineError::InsufficientHistory {
                warmup_start: 30,
                needed: 26
            })
        );
    }

    #[test]
    fn signal_seeds_from_last_nine_macd_values() {
        let config = IndicatorConfig::default();
        let history: Vec<f64> = (0..26).map(|i| 100.0 + (i as f64 * 0.7).sin()).collect();
        let mut state = IndicatorState::seed(&history, 30, &config).unwrap();
        let mut prev = *history.last().unwrap();
        let closes = [100.4, 100.9, 99.8, 100.2, 101.0, 100.7, 100.1, 100.5];
        for (i, &close) in closes.iter().enumerate() {
            let phase = if i == closes.len() - 1 {
                Phase::SignalSeed
            } else {
                Phase::Accumulate
            };
            state.advance(close, close - prev, phase, &config);
            prev = close;
        }
        assert_eq!(state.macd_history.len(), 9);
        let expected = state.macd_history.iter().sum::<f64>() / 9.0;
        assert_approx(state.macd_signal().unwrap(), expected, DEFAULT_EPSILON);

        // Steady minutes no longer grow the history.
        state.advance(100.8, 100.8 - prev, Phase::Steady, &config);
        assert_eq!(state.macd_history.len(), 9);
        let m = 2.0 / 10.0;
        assert_approx(
            state.macd_signal().unwrap(),
            state.macd() * m + expected * (1.0 - m),
            DEFAULT_EPSILON,
        );
    }
}
