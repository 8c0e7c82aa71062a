//! Criterion benchmarks for the length formatter.
//!
//! Run with: `cargo bench -p units`
//!
//! The converter runs for every length cell on every reconcile tick while
//! inch mode is active, so it sits on the hot path.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use units::{format, parse_millimeters, Precision, UnitPolicy};

fn bench_format_inches(c: &mut Criterion) {
    let mut group = c.benchmark_group("format_inches");

    let cases = [
        ("zero", 0.0),
        ("whole", 25.4),
        ("fraction", 38.1),
        ("feet", 631.825),
        ("negative", -12.7),
    ];

    for precision in Precision::ALL {
        let policy = UnitPolicy::inches(precision).with_feet(true);
        for (name, mm) in cases {
            let id = BenchmarkId::new(format!("1/{}", precision.denominator()), name);
            group.bench_with_input(id, &mm, |b, mm| {
                b.iter(|| format(black_box(*mm), &policy))
            });
        }
    }

    group.finish();
}

fn bench_format_millimeters(c: &mut Criterion) {
    let policy = UnitPolicy::millimeters();
    c.bench_function("format_millimeters", |b| {
        b.iter(|| format(black_box(1234.56789), &policy))
    });
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_millimeters");

    for text in ["12.700", "-3.000 mm", "1 1/2\"", "45°"] {
        group.bench_with_input(BenchmarkId::from_parameter(text), &text, |b, text| {
            b.iter(|| parse_millimeters(black_box(text)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_format_inches,
    bench_format_millimeters,
    bench_parse
);
criterion_main!(benches);
