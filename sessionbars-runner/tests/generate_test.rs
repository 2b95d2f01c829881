//! End-to-end generation into a temporary output directory.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sessionbars_runner::{
    generate, session_path, CsvDirProvider, GenerationConfig, GenerationRequest, HolidayCalendar,
    SessionStatus, SyntheticProvider,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn config() -> GenerationConfig {
    GenerationConfig::from_file(&fixture("sessionbars.toml")).unwrap()
}

fn calendar() -> HolidayCalendar {
    HolidayCalendar::from_file(&fixture("holidays.json")).unwrap()
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

#[test]
fn synthetic_run_writes_one_file_per_trading_day() {
    let out = tempfile::tempdir().unwrap();
    let request = GenerationRequest {
        symbols: vec!["AAPL".into(), "MSFT".into()],
        // Tue Jul 2 .. Mon Jul 8: Jul 3 early close, Jul 4 holiday, weekend.
        start: d(2024, 7, 2),
        end: d(2024, 7, 8),
        output_dir: out.path().to_path_buf(),
    };
    let summary = generate(&request, &SyntheticProvider::default(), &calendar(), &config()).unwrap();

    assert!(summary.is_success(), "failures: {:?}", summary.failed);
    assert_eq!(summary.written(), 8);

    let regular = session_path(out.path(), "AAPL", d(2024, 7, 2), 0);
    let lines = read_lines(&regular);
    assert_eq!(
        lines[0],
        "time,open,high,low,close,volume,vwap,sma_5,sma_8,sma_13,ema_12,ema_26,macd,macd_signal,rsi"
    );
    assert_eq!(lines.len(), 1 + 450);
    assert!(lines[1].starts_with("08:31,"));
    assert!(lines.last().unwrap().starts_with("16:00,"));
    assert!(lines.iter().skip(1).all(|l| l.split(',').count() == 15));

    let early = session_path(out.path(), "MSFT", d(2024, 7, 3), 0);
    let lines = read_lines(&early);
    assert_eq!(lines.len(), 1 + 270);
    assert!(lines.last().unwrap().starts_with("13:00,"));

    assert!(!session_path(out.path(), "AAPL", d(2024, 7, 4), 0).exists());
}

#[test]
fn rerun_skips_current_and_replaces_outdated() {
    let out = tempfile::tempdir().unwrap();
    let request = GenerationRequest {
        symbols: vec!["SPY".into()],
        start: d(2024, 3, 5),
        end: d(2024, 3, 5),
        output_dir: out.path().to_path_buf(),
    };
    let provider = SyntheticProvider::default();
    let v0 = config();

    let first = generate(&request, &provider, &calendar(), &v0).unwrap();
    assert_eq!(first.written(), 1);
    let v0_path = session_path(out.path(), "SPY", d(2024, 3, 5), 0);
    let v0_content = std::fs::read_to_string(&v0_path).unwrap();

    let again = generate(&request, &provider, &calendar(), &v0).unwrap();
    assert_eq!(again.written(), 0);
    assert_eq!(again.skipped(), 1);
    assert!(matches!(again.completed[0].status, SessionStatus::Skipped { .. }));
    assert_eq!(std::fs::read_to_string(&v0_path).unwrap(), v0_content);

    let mut v1 = v0.clone();
    v1.output.version = 1;
    let bumped = generate(&request, &provider, &calendar(), &v1).unwrap();
    assert_eq!(bumped.written(), 1);
    assert!(!v0_path.exists());
    let v1_path = session_path(out.path(), "SPY", d(2024, 3, 5), 1);
    // Same inputs, same output: only the version in the name changed.
    assert_eq!(std::fs::read_to_string(v1_path).unwrap(), v0_content);
}

#[test]
fn repeated_symbol_is_generated_once() {
    let out = tempfile::tempdir().unwrap();
    let request = GenerationRequest {
        symbols: vec!["SPY".into(), "QQQ".into(), "SPY".into()],
        start: d(2024, 3, 5),
        end: d(2024, 3, 5),
        output_dir: out.path().to_path_buf(),
    };
    let summary = generate(&request, &SyntheticProvider::default(), &calendar(), &config()).unwrap();

    assert!(summary.is_success(), "failures: {:?}", summary.failed);
    assert_eq!(summary.completed.len(), 2);
    assert_eq!(summary.written(), 2);

    let files: Vec<PathBuf> = std::fs::read_dir(out.path().join("SPY"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(files, vec![session_path(out.path(), "SPY", d(2024, 3, 5), 0)]);
    assert_eq!(read_lines(&files[0]).len(), 1 + 450);
}

fn write_csv_bars(dir: &Path, symbol: &str, start: DateTime<Utc>, minutes: i64, skip: &[i64]) {
    let mut file = std::fs::File::create(dir.join(format!("{symbol}.csv"))).unwrap();
    writeln!(file, "timestamp,open,high,low,close,volume,vwap,trade_count").unwrap();
    for m in 0..minutes {
        if skip.contains(&m) {
            continue;
        }
        let ts = start + Duration::minutes(m);
        let close = 50.0 + (m as f64 * 0.05).sin();
        writeln!(
            file,
            "{},{:.4},{:.4},{:.4},{:.4},{},{:.4},{}",
            ts.to_rfc3339(),
            close,
            close + 0.1,
            close - 0.1,
            close,
            1_000 + m,
            close,
            7
        )
        .unwrap();
    }
}

#[test]
fn csv_provider_gaps_are_repaired_and_bad_sessions_fail_alone() {
    let bars = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    // 2024-03-05 08:00 EST = 13:00 UTC; 10:05 local is minute 125.
    let start = DateTime::parse_from_rfc3339("2024-03-05T13:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    write_csv_bars(bars.path(), "GOOD", start, 481, &[125]);
    // Missing the opening minute: fatal for this session only.
    write_csv_bars(bars.path(), "LATE", start, 481, &[0]);

    let request = GenerationRequest {
        symbols: vec!["GOOD".into(), "LATE".into(), "ABSENT".into()],
        start: d(2024, 3, 5),
        end: d(2024, 3, 5),
        output_dir: out.path().to_path_buf(),
    };
    let summary = generate(&request, &CsvDirProvider::new(bars.path()), &calendar(), &config()).unwrap();

    assert!(!summary.is_success());
    assert_eq!(summary.written(), 1);
    assert_eq!(summary.failed.len(), 2);
    match &summary.completed[0].status {
        SessionStatus::Written { rows, synthesized, .. } => {
            assert_eq!(*rows, 450);
            assert_eq!(*synthesized, 1);
        }
        other => panic!("expected written, got {other:?}"),
    }

    let lines = read_lines(&session_path(out.path(), "GOOD", d(2024, 3, 5), 0));
    let gap_row = lines.iter().find(|l| l.starts_with("10:05,")).unwrap();
    let fields: Vec<&str> = gap_row.split(',').collect();
    assert_eq!(fields[5], "0");
    assert_eq!(fields[1], fields[4]);

    assert!(!out.path().join("LATE").join("LATE_20240305_v000.csv").exists());
    assert!(summary.failed.iter().any(|f| f.symbol == "LATE" && f.reason.contains("session start")));
    assert!(summary.failed.iter().any(|f| f.symbol == "ABSENT"));
}
