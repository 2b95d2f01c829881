//! Bar providers and structured data errors.
//!
//! A `BarProvider` returns minute bars for a symbol over a UTC range. Bars are
//! converted to session-local wall-clock time by the pipeline, so providers
//! never deal with the session's time zone.
//!
//! Implementations:
//! - `CsvDirProvider`: one CSV file per symbol in a directory
//! - `SyntheticProvider`: deterministic random walk, developer-only, tagged as synthetic

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sessionbars_core::{Bar, SessionClock};
use thiserror::Error;
use tracing::warn;

/// Minute bar as delivered by a provider, stamped in UTC.
///
/// Provider-computed VWAP and trade counts are not part of this type;
/// VWAP is always recomputed from OHLCV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl RawBar {
    /// Re-stamp in the session's local wall clock.
    pub fn to_session_bar(&self, clock: &SessionClock) -> Bar {
        Bar {
            timestamp: clock.to_local(self.timestamp),
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("no bar file for symbol '{symbol}' at {path}")]
    SymbolNotFound { symbol: String, path: PathBuf },

    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{path}: bad timestamp '{value}' on record {record}")]
    BadTimestamp {
        path: PathBuf,
        record: usize,
        value: String,
    },

    #[error("invalid range: {start} is after {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Source of minute bars.
pub trait BarProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Bars for `symbol` with `start <= timestamp <= end`, in timestamp order.
    fn fetch(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawBar>, DataError>;

    /// Whether bars from this provider are fabricated.
    fn is_synthetic(&self) -> bool {
        false
    }
}

// ─── CSV directory ──────────────────────────────────────────────────

/// Reads `<root>/<SYMBOL>.csv`.
///
/// Columns: `timestamp` (RFC 3339), `open`, `high`, `low`, `close`, `volume`.
/// Any other columns (`vwap`, `trade_count`, ...) are ignored.
#[derive(Debug, Clone)]
pub struct CsvDirProvider {
    root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvBarRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

impl CsvDirProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.root.join(format!("{symbol}.csv"))
    }
}

impl BarProvider for CsvDirProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawBar>, DataError> {
        if start > end {
            return Err(DataError::InvalidRange { start, end });
        }
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
                path,
            });
        }
        let file = std::fs::File::open(&path).map_err(|source| DataError::Io {
            path: path.clone(),
            source,
        })?;

        let mut reader = csv::Reader::from_reader(file);
        let mut bars = Vec::new();
        for (record, row) in reader.deserialize::<CsvBarRecord>().enumerate() {
            let row = row?;
            let timestamp = DateTime::parse_from_rfc3339(row.timestamp.trim())
                .map_err(|_| DataError::BadTimestamp {
                    path: path.clone(),
                    record: record + 1,
                    value: row.timestamp.clone(),
                })?
                .with_timezone(&Utc);
            if timestamp < start || timestamp > end {
                continue;
            }
            bars.push(RawBar {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }
        Ok(bars)
    }
}

// ─── Synthetic ──────────────────────────────────────────────────────

/// Deterministic random-walk minute bars for development.
///
/// The RNG is seeded from BLAKE3 of `symbol|range start`, so the same request
/// always yields the same bars. A fraction of minutes after the first is
/// dropped so that gap repair is exercised.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    drop_rate: f64,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self { drop_rate: 0.02 }
    }
}

impl SyntheticProvider {
    pub fn new(drop_rate: f64) -> Self {
        Self {
            drop_rate: drop_rate.clamp(0.0, 0.9),
        }
    }

    pub fn drop_rate(&self) -> f64 {
        self.drop_rate
    }

    fn rng_for(symbol: &str, start: DateTime<Utc>) -> StdRng {
        let seed = blake3::hash(format!("{symbol}|{}", start.to_rfc3339()).as_bytes());
        StdRng::from_seed(*seed.as_bytes())
    }
}

impl BarProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn is_synthetic(&self) -> bool {
        true
    }

    fn fetch(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawBar>, DataError> {
        if start > end {
            return Err(DataError::InvalidRange { start, end });
        }
        warn!(symbol, "generating synthetic bars, output is not market data");

        let mut rng = Self::rng_for(symbol, start);
        let minutes = (end - start).num_minutes();
        let mut price: f64 = rng.gen_range(20.0..400.0);
        let mut bars = Vec::with_capacity(minutes as usize + 1);

        for minute in 0..=minutes {
            let step: f64 = rng.gen_range(-0.002..0.002);
            let open = price;
            let close = (price * (1.0 + step)).max(0.01);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.001));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.001));
            let volume = rng.gen_range(100..20_000u64);
            price = close;

            if minute > 0 && rng.gen_bool(self.drop_rate) {
                continue;
            }
            bars.push(RawBar {
                timestamp: start + Duration::minutes(minute),
                open,
                high,
                low,
                close,
                volume,
            });
        }
        Ok(bars)
    }
}
