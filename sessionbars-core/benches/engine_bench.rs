//! Criterion benchmarks for the per-session hot path.
//!
//! Benchmarks:
//! 1. Normalization of a sparse session onto the minute timeline
//! 2. Indicator computation over a dense session
//! 3. Row assembly into formatted output fields

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sessionbars_core::{
    compute_session, normalize, Bar, IndicatorConfig, RowAssembler, SessionClock, SessionConfig,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_clock() -> SessionClock {
    let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    SessionClock::new(date, &SessionConfig::default()).unwrap()
}

fn make_bars(clock: &SessionClock) -> Vec<Bar> {
    (0..clock.minute_count())
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 2.0;
            Bar {
                timestamp: clock.timestamp_at(i),
                open: close - 0.05,
                high: close + 0.2,
                low: close - 0.2,
                close,
                volume: 1_000 + (i as u64 % 700),
            }
        })
        .collect()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_normalize(c: &mut Criterion) {
    let clock = make_clock();
    let sparse: Vec<Bar> = make_bars(&clock)
        .into_iter()
        .enumerate()
        .filter(|(i, _)| *i == 0 || i % 5 != 0)
        .map(|(_, b)| b)
        .collect();

    c.bench_function("normalize_sparse_session", |b| {
        b.iter(|| normalize(black_box(&sparse), black_box(&clock)))
    });
}

fn bench_compute(c: &mut Criterion) {
    let clock = make_clock();
    let bars = make_bars(&clock);
    let config = IndicatorConfig::default();

    c.bench_function("compute_full_session", |b| {
        b.iter(|| compute_session(black_box(&clock), black_box(&config), black_box(&bars)))
    });
}

fn bench_assemble(c: &mut Criterion) {
    let clock = make_clock();
    let bars = make_bars(&clock);
    let config = IndicatorConfig::default();
    let rows = compute_session(&clock, &config, &bars).unwrap();
    let assembler = RowAssembler::new(&config, 3);

    c.bench_function("assemble_session_rows", |b| {
        b.iter(|| {
            rows.iter()
                .map(|r| assembler.assemble(black_box(r)))
                .count()
        })
    });
}

criterion_group!(benches, bench_normalize, bench_compute, bench_assemble);
criterion_main!(benches);
