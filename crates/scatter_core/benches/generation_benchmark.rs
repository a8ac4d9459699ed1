//! Benchmark for instance generation throughput.
//!
//! TARGET: 1,000,000 disc instances well under one frame on a desktop CPU
//!
//! Run with: cargo bench --package scatter_core --bench generation_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use scatter_core::{
    generate_into, generate_into_sequential, DiscProperties, InstanceMatrix, SphereProperties,
    TransformData, Xorshift32,
};

fn benchmark_prng(c: &mut Criterion) {
    c.bench_function("xorshift_rotation", |b| {
        let mut rng = Xorshift32::new(777);
        b.iter(|| black_box(rng.next_rotation()));
    });
}

fn benchmark_disc(c: &mut Criterion) {
    let disc = DiscProperties::default();
    let mut out = vec![InstanceMatrix::ZERO; 1_000_192];

    let mut group = c.benchmark_group("disc_generation");
    group.throughput(Throughput::Elements(1_000_000));
    group.sample_size(10);

    group.bench_function("1M_parallel", |b| {
        b.iter(|| generate_into(&disc, black_box(&mut out), 1_000_000, &TransformData::IDENTITY));
    });
    group.bench_function("1M_sequential", |b| {
        b.iter(|| {
            generate_into_sequential(&disc, black_box(&mut out), 1_000_000, &TransformData::IDENTITY);
        });
    });

    group.finish();
}

fn benchmark_sphere(c: &mut Criterion) {
    let sphere = SphereProperties {
        inside_sphere: true,
        ..SphereProperties::default()
    };
    let mut out = vec![InstanceMatrix::ZERO; 100_096];

    let mut group = c.benchmark_group("sphere_generation");
    group.throughput(Throughput::Elements(100_000));

    group.bench_function("100k_parallel", |b| {
        b.iter(|| generate_into(&sphere, black_box(&mut out), 100_000, &TransformData::IDENTITY));
    });

    group.finish();
}

criterion_group!(benches, benchmark_prng, benchmark_disc, benchmark_sphere);
criterion_main!(benches);
