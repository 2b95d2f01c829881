//! Row assembler: engine rows to the fixed 15-column output schema.
//!
//! Column order: time, open, high, low, close, volume, vwap, three SMAs,
//! fast EMA, slow EMA, macd, macd_signal, rsi. Indicator column names carry
//! their configured periods (`sma_5`, `ema_12`, ...).
//!
//! Formatting:
//! - time: `HH:MM`, session-local
//! - volume: integer
//! - prices and indicators: fixed `decimals` places (3 by default)
//! - absent values (VWAP with no volume, MACD signal before its seed): empty

use crate::domain::IndicatorRow;
use crate::engine::IndicatorConfig;

/// Number of columns in every output row.
pub const COLUMN_COUNT: usize = 15;

/// Default number of decimal places for prices and indicators.
pub const DEFAULT_DECIMALS: usize = 3;

/// One formatted output row, fields in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow(pub Vec<String>);

impl OutputRow {
    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn get(&self, column: usize) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }
}

/// Formats engine rows for one output unit.
#[derive(Debug, Clone, PartialEq)]
pub struct RowAssembler {
    header: Vec<String>,
    decimals: usize,
}

impl RowAssembler {
    pub fn new(config: &IndicatorConfig, decimals: usize) -> Self {
        let [short, medium, long] = config.sma_periods;
        let header = vec![
            "time".to_string(),
            "open".to_string(),
            "high".to_string(),
            "low".to_string(),
            "close".to_string(),
            "volume".to_string(),
            "vwap".to_string(),
            format!("sma_{short}"),
            format!("sma_{medium}"),
            format!("sma_{long}"),
            format!("ema_{}", config.ema_fast),
            format!("ema_{}", config.ema_slow),
            "macd".to_string(),
            "macd_signal".to_string(),
            "rsi".to_string(),
        ];
        Self { header, decimals }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn decimals(&self) -> usize {
        self.decimals
    }

    pub fn assemble(&self, row: &IndicatorRow) -> OutputRow {
        let num = |v: f64| fixed(v, self.decimals);
        let opt = |v: Option<f64>| v.map(num).unwrap_or_default();
        let bar = &row.bar;

        OutputRow(vec![
            bar.timestamp.format("%H:%M").to_string(),
            num(bar.open),
            num(bar.high),
            num(bar.low),
            num(bar.close),
            bar.volume.to_string(),
            opt(row.vwap),
            num(row.sma[0]),
            num(row.sma[1]),
            num(row.sma[2]),
            num(row.ema_fast),
            num(row.ema_slow),
            num(row.macd),
            opt(row.macd_signal),
            num(row.rsi),
        ])
    }
}

/// Fixed-decimal rendering. Values that round to zero print unsigned.
fn fixed(v: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, v);
    match s.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => s,
    }
}

/// Destination for one output unit's header and rows.
///
/// A sink that is dropped without [`finish`](RowSink::finish) must leave no
/// partial output behind.
pub trait RowSink {
    type Error;

    fn write_header(&mut self, header: &[String]) -> Result<(), Self::Error>;

    fn write_row(&mut self, row: &OutputRow) -> Result<(), Self::Error>;

    fn finish(self) -> Result<(), Self::Error>
    where
        Self: Sized;
}

/// In-memory sink, mostly for tests and previews.
///
/// `finish` consumes the sink, so pass `&mut VecSink` to inspect what was
/// written afterwards.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VecSink {
    pub header: Vec<String>,
    pub rows: Vec<OutputRow>,
}

impl RowSink for &mut VecSink {
    type Error = std::convert::Infallible;

    fn write_header(&mut self, header: &[String]) -> Result<(), Self::Error> {
        self.header = header.to_vec();
        Ok(())
    }

    fn write_row(&mut self, row: &OutputRow) -> Result<(), Self::Error> {
        self.rows.push(row.clone());
        Ok(())
    }

    fn finish(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Write a header and every row of a session into `sink`, then finish it.
pub fn emit_session<S: RowSink>(
    assembler: &RowAssembler,
    rows: &[IndicatorRow],
    mut sink: S,
) -> Result<(), S::Error> {
    sink.write_header(assembler.header())?;
    for row in rows {
        sink.write_row(&assembler.assemble(row))?;
    }
    sink.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::NaiveDate;

    fn row(vwap: Option<f64>, macd_signal: Option<f64>) -> IndicatorRow {
        let timestamp = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(9, 7, 0)
            .unwrap();
        IndicatorRow {
            offset: 67,
            bar: Bar {
                timestamp,
                open: 101.0,
                high: 101.23456,
                low: 100.9996,
                close: 101.1,
                volume: 4_200,
            },
            vwap,
            sma: [101.05, 100.98765, 100.9],
            ema_fast: 101.0004,
            ema_slow: 100.5,
            macd: -0.0123,
            macd_signal,
            rsi: 55.55555,
        }
    }

    #[test]
    fn default_header_names_periods() {
        let assembler = RowAssembler::new(&IndicatorConfig::default(), DEFAULT_DECIMALS);
        assert_eq!(
            assembler.header(),
            [
                "time", "open", "high", "low", "close", "volume", "vwap", "sma_5", "sma_8",
                "sma_13", "ema_12", "ema_26", "macd", "macd_signal", "rsi"
            ]
        );
        assert_eq!(assembler.header().len(), COLUMN_COUNT);
    }

    #[test]
    fn formats_fields_in_schema_order() {
        let assembler = RowAssembler::new(&IndicatorConfig::default(), DEFAULT_DECIMALS);
        let out = assembler.assemble(&row(Some(100.12345), Some(0.25)));
        assert_eq!(
            out.fields(),
            [
                "09:07", "101.000", "101.235", "101.000", "101.100", "4200", "100.123",
                "101.050", "100.988", "100.900", "101.000", "100.500", "-0.012", "0.250",
                "55.556"
            ]
        );
    }

    #[test]
    fn absent_values_are_empty_fields() {
        let assembler = RowAssembler::new(&IndicatorConfig::default(), DEFAULT_DECIMALS);
        let out = assembler.assemble(&row(None, None));
        assert_eq!(out.get(6), Some(""));
        assert_eq!(out.get(13), Some(""));
        assert_eq!(out.fields().len(), COLUMN_COUNT);
    }

    #[test]
    fn emit_session_writes_header_then_rows() {
        let assembler = RowAssembler::new(&IndicatorConfig::default(), 2);
        let rows = vec![row(None, None), row(Some(2.0), Some(0.1))];
        let mut sink = VecSink::default();
        emit_session(&assembler, &rows, &mut sink).unwrap();

        assert_eq!(sink.header, assembler.header());
        assert_eq!(sink.rows.len(), 2);
        assert_eq!(sink.rows[0], assembler.assemble(&rows[0]));
        assert_eq!(sink.rows[0].get(6), Some(""));
        assert_eq!(sink.rows[0].get(13), Some(""));
        assert_eq!(sink.rows[1].get(0), Some("09:07"));
        assert_eq!(sink.rows[1].get(6), Some("2.00"));
        assert_eq!(sink.rows[1].get(13), Some("0.10"));
    }

    #[test]
    fn values_rounding_to_zero_print_unsigned() {
        let assembler = RowAssembler::new(&IndicatorConfig::default(), DEFAULT_DECIMALS);
        let mut r = row(Some(100.0), Some(-0.0004));
        r.macd = -0.0001;
        let out = assembler.assemble(&r);
        assert_eq!(out.get(12), Some("0.000"));
        assert_eq!(out.get(13), Some("0.000"));

        r.macd = -0.0;
        assert_eq!(assembler.assemble(&r).get(12), Some("0.000"));

        r.macd = -0.0005001;
        assert_eq!(assembler.assemble(&r).get(12), Some("-0.001"));
    }
}
