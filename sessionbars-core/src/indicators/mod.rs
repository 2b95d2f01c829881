//! Incremental indicator primitives.
//!
//! Unlike batch indicators that map a whole series to a whole series, these
//! primitives hold a single running value and are advanced one minute at a
//! time by the engine. Each is seeded explicitly from a trailing window of
//! closes, so the engine decides when seeding happens.

pub mod ema;
pub mod rsi;
pub mod sma;
pub mod vwap;

pub use ema::{ema_multiplier, Ema};
pub use rsi::{rsi_from_averages, WilderRsi};
pub use sma::{mean, trailing_mean};
pub use vwap::Vwap;

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
