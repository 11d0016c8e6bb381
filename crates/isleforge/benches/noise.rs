mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use isleforge::field::{NoiseField, NoiseSettings};

const RESOLUTIONS: [usize; 3] = [129, 257, 513];
const OCTAVES: [u32; 3] = [1, 4, 8];

fn noise_generate_benches(c: &mut Criterion) {
    for &octaves in &OCTAVES {
        let mut group = c.benchmark_group(format!("noise/generate/octaves_{octaves}"));
        let field = NoiseField::new(NoiseSettings::new(10.0, octaves, 0.5, 2.0, 1337));

        for &res in &RESOLUTIONS {
            group.throughput(common::cells_throughput(res));
            group.bench_with_input(BenchmarkId::from_parameter(res), &res, |b, &res| {
                b.iter(|| {
                    let out = field.generate(res, res);
                    black_box(out.len());
                });
            });
        }

        group.finish();
    }
}

fn noise_sample_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("noise/sample");
    let field = NoiseField::new(NoiseSettings::new(10.0, 4, 0.5, 2.0, 7));
    group.throughput(common::elements_throughput(1024));
    group.bench_function("1024_points", |b| {
        b.iter(|| {
            let mut acc = 0.0f32;
            for i in 0..1024 {
                let x = (i % 32) as f32 * 3.1;
                let y = (i / 32) as f32 * 3.1;
                acc += field.raw(black_box(x), black_box(y));
            }
            black_box(acc);
        });
    });
    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = noise_generate_benches, noise_sample_benches
}
criterion_main!(benches);
