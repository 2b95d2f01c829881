//! Injectable indicator parameters.

use serde::{Deserialize, Serialize};

use super::EngineError;
use crate::session::Anchors;

/// Numeric parameters for every indicator the engine computes.
///
/// Defaults: EMA 12/26 with smoothing 2, MACD signal 9, RSI 14, SMA 5/8/13.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub smoothing: f64,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub signal_period: usize,
    pub rsi_period: usize,
    pub sma_periods: [usize; 3],
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            smoothing: 2.0,
            ema_fast: 12,
            ema_slow: 26,
            signal_period: 9,
            rsi_period: 14,
            sma_periods: [5, 8, 13],
        }
    }
}

impl IndicatorConfig {
    /// Check parameter sanity independent of any session schedule.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.smoothing.is_finite() && self.smoothing > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "smoothing must be positive, got {}",
                self.smoothing
            )));
        }
        let periods = [
            ("ema_fast", self.ema_fast),
            ("ema_slow", self.ema_slow),
            ("signal_period", self.signal_period),
            ("rsi_period", self.rsi_period),
        ];
        for (name, period) in periods {
            if period == 0 {
                return Err(EngineError::InvalidConfig(format!("{name} must be >= 1")));
            }
        }
        if self.sma_periods.contains(&0) {
            return Err(EngineError::InvalidConfig("sma periods must be >= 1".into()));
        }
        if self.ema_fast >= self.ema_slow {
            return Err(EngineError::InvalidConfig(format!(
                "ema_fast ({}) must be shorter than ema_slow ({})",
                self.ema_fast, self.ema_slow
            )));
        }
        Ok(())
    }

    /// Bars of close history (ending at the seed minute) needed to seed everything.
    pub fn seed_history(&self) -> usize {
        self.ema_slow.max(self.rsi_period + 1)
    }

    /// Bars of close history needed at the first emitted minute.
    pub fn emit_history(&self) -> usize {
        self.sma_periods.iter().copied().max().unwrap_or(1)
    }

    /// Check that a session's anchors leave room to seed and to collect the
    /// MACD history the signal line is seeded from.
    pub fn validate_against(&self, anchors: Anchors) -> Result<(), EngineError> {
        self.validate()?;

        let needed = self.seed_history().max(self.emit_history().saturating_sub(1));
        if anchors.warmup_start + 1 < needed {
            return Err(EngineError::InsufficientHistory {
                warmup_start: anchors.warmup_start,
                needed,
            });
        }
        if anchors.signal_warmup != anchors.warmup_start + self.signal_period - 1 {
            return Err(EngineError::InconsistentSchedule {
                warmup_start: anchors.warmup_start,
                signal_warmup: anchors.signal_warmup,
                signal_period: self.signal_period,
            });
        }
        Ok(())
    }

    /// Capacity of the rolling close history.
    pub fn history_capacity(&self) -> usize {
        self.seed_history().max(self.emit_history())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchors(warmup_start: usize, signal_warmup: usize) -> Anchors {
        Anchors {
            warmup_start,
            signal_warmup,
            session_open: 90,
        }
    }

    #[test]
    fn default_config_is_valid() {
        let config = IndicatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.seed_history(), 26);
        assert_eq!(config.history_capacity(), 26);
        assert!(config.validate_against(anchors(30, 38)).is_ok());
    }

    #[test]
    fn warmup_too_early_is_insufficient_history() {
        let config = IndicatorConfig::default();
        // 25 bars (offsets 0..=24) cannot seed a 26-period EMA.
        let err = config.validate_against(anchors(24, 32)).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientHistory {
                warmup_start: 24,
                needed: 26
            }
        );
        // Offset 25 is exactly enough.
        assert!(config.validate_against(anchors(25, 33)).is_ok());
    }

    #[test]
    fn signal_anchor_must_match_signal_period() {
        let config = IndicatorConfig::default();
        assert!(matches!(
            config.validate_against(anchors(30, 40)),
            Err(EngineError::InconsistentSchedule { .. })
        ));

        let short_signal = IndicatorConfig {
            signal_period: 3,
            ..IndicatorConfig::default()
        };
        assert!(short_signal.validate_against(anchors(30, 32)).is_ok());
    }

    #[test]
    fn rejects_bad_periods() {
        let zero = IndicatorConfig {
            rsi_period: 0,
            ..IndicatorConfig::default()
        };
        assert!(matches!(zero.validate(), Err(EngineError::InvalidConfig(_))));

        let inverted = IndicatorConfig {
            ema_fast: 26,
            ema_slow: 12,
            ..IndicatorConfig::default()
        };
        assert!(matches!(inverted.validate(), Err(EngineError::InvalidConfig(_))));

        let no_smoothing = IndicatorConfig {
            smoothing: 0.0,
            ..IndicatorConfig::default()
        };
        assert!(no_smoothing.validate().is_err());
    }

    #[test]
    fn long_sma_raises_history_capacity() {
        let config = IndicatorConfig {
            sma_periods: [5, 8, 40],
            ..IndicatorConfig::default()
        };
        assert_eq!(config.history_capacity(), 40);
        // First emitted minute (+31) needs 40 bars but only has 32.
        assert!(config.validate_against(anchors(30, 38)).is_err());
        assert!(config.validate_against(anchors(39, 47)).is_ok());
    }
}
