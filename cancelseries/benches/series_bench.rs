//! Benchmarks for series handoff.

use cancelseries::cancellation::CancellationSeries;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn series_benchmark(c: &mut Criterion) {
    let series = CancellationSeries::new();

    c.bench_function("next", |b| {
        b.iter(|| black_box(series.next()))
    });

    c.bench_function("next_then_clear", |b| {
        b.iter(|| {
            let token = series.next();
            series.clear();
            black_box(token)
        })
    });
}

criterion_group!(benches, series_benchmark);
criterion_main!(benches);
