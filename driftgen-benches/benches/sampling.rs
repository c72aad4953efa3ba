//! Sampling throughput across mixture shapes.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use driftgen_benches::fixture_model;

fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample");
    for (components, dimensions) in [(2, 2), (5, 10), (10, 20)] {
        let mut model = fixture_model(components, dimensions);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{components}x{dimensions}")),
            &(),
            |b, ()| b.iter(|| model.sample()),
        );
    }
    group.finish();
}

fn bench_density(c: &mut Criterion) {
    let mut group = c.benchmark_group("density");
    for (components, dimensions) in [(2, 2), (5, 10)] {
        let model = fixture_model(components, dimensions);
        let point = vec![0.25; dimensions];
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{components}x{dimensions}")),
            &point,
            |b, point| b.iter(|| model.density(point)),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_sampling, bench_density);
criterion_main!(benches);
