//! Streaming computation over one session's dense minute series.

use std::collections::VecDeque;

use tracing::debug;

use super::{EngineError, IndicatorConfig, IndicatorState, Phase};
use crate::data::verify_dense;
use crate::domain::{Bar, IndicatorRow};
use crate::indicators::{trailing_mean, Vwap};
use crate::session::{Anchors, SessionClock};

/// Minute-by-minute indicator computation for a single (symbol, day) session.
///
/// Bars are pushed in order with [`step`](Self::step); each call returns the
/// emitted row for that minute, if any. [`finish`](Self::finish) checks that
/// the whole session was consumed.
#[derive(Debug)]
pub struct SessionComputation<'a> {
    config: &'a IndicatorConfig,
    clock: SessionClock,
    anchors: Anchors,
    closes: VecDeque<f64>,
    capacity: usize,
    vwap: Vwap,
    state: Option<IndicatorState>,
    next_offset: usize,
}

impl<'a> SessionComputation<'a> {
    /// Prepare a computation for `clock`, rejecting schedules the configured
    /// lookbacks cannot be seeded in.
    pub fn new(clock: &SessionClock, config: &'a IndicatorConfig) -> Result<Self, EngineError> {
        let anchors = clock.anchors();
        config.validate_against(anchors)?;
        let capacity = config.history_capacity();
        Ok(Self {
            config,
            clock: clock.clone(),
            anchors,
            closes: VecDeque::with_capacity(capacity + 1),
            capacity,
            vwap: Vwap::new(),
            state: None,
            next_offset: 0,
        })
    }

    /// Phase of the next minute to be consumed.
    pub fn phase(&self) -> Phase {
        Phase::at(self.next_offset, &self.anchors)
    }

    /// Number of minutes consumed so far.
    pub fn consumed(&self) -> usize {
        self.next_offset
    }

    /// Consume the next minute's bar.
    pub fn step(&mut self, bar: &Bar) -> Result<Option<IndicatorRow>, EngineError> {
        let offset = self.next_offset;
        if offset >= self.clock.minute_count() {
            return Err(EngineError::PastSessionEnd);
        }
        let expected = self.clock.timestamp_at(offset);
        if bar.timestamp != expected {
            return Err(EngineError::UnexpectedMinute {
                offset,
                expected,
                actual: bar.timestamp,
            });
        }

        let previous_close = self.closes.back().copied();
        self.closes.push_back(bar.close);
        if self.closes.len() > self.capacity {
            self.closes.pop_front();
        }

        if offset == self.anchors.session_open {
            self.vwap.reset_to(bar);
        } else {
            self.vwap.add(bar);
        }

        let phase = Phase::at(offset, &self.anchors);
        match phase {
            Phase::PreWarmup => {}
            Phase::Seed => {
                let history = self.closes.make_contiguous();
                self.state = Some(IndicatorState::seed(history, offset, self.config)?);
                debug!(offset, "indicator state seeded");
            }
            _ => {
                let delta = previous_close.map_or(0.0, |prev| bar.close - prev);
                if let Some(state) = self.state.as_mut() {
                    state.advance(bar.close, delta, phase, self.config);
                }
            }
        }
        self.next_offset += 1;

        if !phase.emits() {
            return Ok(None);
        }
        let state = self.state.as_ref().ok_or(EngineError::InsufficientHistory {
            warmup_start: self.anchors.warmup_start,
            needed: self.config.seed_history(),
        })?;

        let history = self.closes.make_contiguous();
        let mut sma = [0.0; 3];
        for (slot, &period) in sma.iter_mut().zip(self.config.sma_periods.iter()) {
            *slot = trailing_mean(history, period).ok_or(EngineError::InsufficientHistory {
                warmup_start: self.anchors.warmup_start,
                needed: period,
            })?;
        }

        Ok(Some(IndicatorRow {
            offset,
            bar: bar.clone(),
            vwap: self.vwap.value(),
            sma,
            ema_fast: state.ema_fast.value(),
            ema_slow: state.ema_slow.value(),
            macd: state.macd(),
            macd_signal: state.macd_signal(),
            rsi: state.rsi.value(),
        }))
    }

    /// Confirm every session minute was consumed.
    pub fn finish(self) -> Result<(), EngineError> {
        let expected = self.clock.minute_count();
        if self.next_offset != expected {
            return Err(EngineError::Incomplete {
                consumed: self.next_offset,
                expected,
            });
        }
        Ok(())
    }
}

/// Compute every emitted row for a dense session series.
///
/// The series must hold exactly one bar per session minute. Any failure
/// discards all rows.
pub fn compute_session(
    clock: &SessionClock,
    config: &IndicatorConfig,
    bars: &[Bar],
) -> Result<Vec<IndicatorRow>, EngineError> {
    verify_dense(bars, clock)?;

    let mut computation = SessionComputation::new(clock, config)?;
    let first_emitted = clock.anchors().warmup_start + 1;
    let mut rows = Vec::with_capacity(clock.minute_count().saturating_sub(first_emitted));
    for bar in bars {
        if let Some(row) = computation.step(bar)? {
            rows.push(row);
        }
    }
    computation.finish()?;
    Ok(rows)
}
