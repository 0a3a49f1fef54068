//! Cache and cross-rate benchmarks.
//!
//! Run with: `cargo bench --package quiver-bench`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quiver_bench::{merge_inputs, rate_index, series};
use quiver_fx::RateQuery;
use quiver_store::{merge_series, read_table, write_table};
use std::hint::black_box;

const SIZES: &[usize] = &[1_000, 10_000, 50_000];
const QUOTES: &[&str] = &["EUR", "GBP", "JPY", "CHF", "AUD", "CAD", "NZD", "SEK"];

fn merge_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    for &len in SIZES {
        let (existing, fresh) = merge_inputs(len, 5, 95);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| merge_series(black_box(&existing), black_box(&fresh)));
        });
    }
    group.finish();
}

fn table_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("table");
    for &len in SIZES {
        let data = series(len, 0, 100.0);
        let mut encoded = Vec::new();
        runtime
            .block_on(write_table(&data, &mut encoded))
            .expect("encode");
        group.throughput(Throughput::Bytes(encoded.len() as u64));

        let capacity = encoded.len();
        group.bench_with_input(BenchmarkId::new("write", len), &data, |b, data| {
            b.to_async(&runtime).iter(|| async move {
                let mut out = Vec::with_capacity(capacity);
                write_table(black_box(data), &mut out).await.expect("encode");
                out
            });
        });
        group.bench_with_input(BenchmarkId::new("read", len), &encoded, |b, encoded| {
            let bytes = encoded.as_slice();
            b.to_async(&runtime)
                .iter(|| async move { read_table(black_box(bytes)).await.expect("decode") });
        });
    }
    group.finish();
}

fn rate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate");
    for &len in SIZES {
        let index = rate_index(QUOTES, len);
        group.bench_with_input(BenchmarkId::new("direct_latest", len), &index, |b, index| {
            b.iter(|| index.rate(black_box("USD"), black_box("JPY"), RateQuery::Latest));
        });
        group.bench_with_input(BenchmarkId::new("inverse_latest", len), &index, |b, index| {
            b.iter(|| index.latest_close(black_box("JPY"), black_box("USD")));
        });
        group.bench_with_input(BenchmarkId::new("triangulated_latest", len), &index, |b, index| {
            b.iter(|| index.latest_close(black_box("NZD"), black_box("SEK")));
        });
    }
    group.finish();
}

criterion_group!(benches, merge_benchmark, table_benchmark, rate_benchmark);
criterion_main!(benches);
