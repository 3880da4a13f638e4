//! Benchmarks for per-tick feature processing
//!
//! Run with: cargo bench

use camdirector::analysis::{FeatureTracker, RunningStats};
use camdirector::session::types::{AvatarData, StateData};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn rows(width: usize, count: usize) -> Vec<Vec<f64>> {
    (0..count)
        .map(|i| (0..width).map(|j| ((i * 31 + j * 7) % 97) as f64 * 0.01).collect())
        .collect()
}

fn bench_running_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("running_stats");
    let width = 67;

    for window in [10, 100, 1000].iter() {
        let data = rows(width, window * 3);
        group.throughput(Throughput::Elements(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("push", window), &data, |b, data| {
            b.iter(|| {
                let mut stats = RunningStats::windowed(width, *window);
                for row in data {
                    stats.push(black_box(row.clone()));
                }
                black_box(stats.variance(0))
            })
        });
    }

    let data = rows(width, 3000);
    group.bench_function("push_unbounded", |b| {
        b.iter(|| {
            let mut stats = RunningStats::unbounded(width);
            for row in &data {
                stats.push(black_box(row.clone()));
            }
            black_box(stats.mean(0))
        })
    });

    group.finish();
}

fn bench_feature_row(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_tracker");
    let states: Vec<StateData> = (0..300)
        .map(|i| {
            let avatar = AvatarData {
                voice_volume: (i % 10) as f32 * 0.1,
                ..AvatarData::default()
            };
            StateData::new(i as f32, Vec::new(), vec![avatar; 2])
        })
        .collect();

    group.throughput(Throughput::Elements(states.len() as u64));
    group.bench_function("observe_and_assemble", |b| {
        b.iter(|| {
            let mut tracker = FeatureTracker::new(2, 100);
            tracker.begin(&states[0]);
            for (i, pair) in states.windows(2).enumerate() {
                tracker.observe((i % 3) as i32, &pair[0]);
                black_box(tracker.feature_row(&pair[1]));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_running_stats, bench_feature_row);
criterion_main!(benches);
