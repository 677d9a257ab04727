use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ghostsub_core::scan::missing::{find_missing, FinderConfig};
use ghostsub_core::scan::scorer::{rank_candidates, CountBackend, ScorerConfig};

const SIZES: &[usize] = &[8192, 65536, 262_144];

fn test_data(size: usize) -> Vec<u8> {
    let text = b"It was the best of times, it was the worst of times, it was the age of wisdom. ";
    text.iter().cycle().take(size).copied().collect()
}

fn bench_scorer(c: &mut Criterion) {
    let mut group = c.benchmark_group("scorer");
    group.sample_size(10);
    for &size in SIZES {
        let data = test_data(size);
        group.throughput(Throughput::Bytes(size as u64));

        for (name, backend) in [("windows", CountBackend::Windows), ("packed", CountBackend::Packed)] {
            let cfg = ScorerConfig {
                backend,
                ..ScorerConfig::default()
            };
            group.bench_with_input(BenchmarkId::new(name, size), &data, |b, data| {
                b.iter(|| rank_candidates(data, 1, 8, &cfg).unwrap());
            });
        }
    }
    group.finish();
}

fn bench_missing(c: &mut Criterion) {
    let mut group = c.benchmark_group("missing");
    group.sample_size(10);
    let cfg = FinderConfig::default();
    for &size in SIZES {
        let data = test_data(size);
        group.throughput(Throughput::Bytes(size as u64));
        for length in 1..=3usize {
            group.bench_with_input(BenchmarkId::new(format!("len{length}"), size), &data, |b, data| {
                b.iter(|| find_missing(data, length, &cfg).unwrap());
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_scorer, bench_missing);
criterion_main!(benches);
