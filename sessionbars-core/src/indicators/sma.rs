//! Simple Moving Average (SMA).
//!
//! Mean of the trailing `period` closes, inclusive of the current minute.

/// Arithmetic mean of `values`. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean of the last `period` entries of `history`.
///
/// Returns `None` when `period` is zero or the history is shorter than `period`.
pub fn trailing_mean(history: &[f64], period: usize) -> Option<f64> {
    if period == 0 || history.len() < period {
        return None;
    }
    mean(&history[history.len() - period..])
}
