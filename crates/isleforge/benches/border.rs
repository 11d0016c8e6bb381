mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use isleforge::border::{BorderSettings, WorldBorder};
use isleforge::field::ScalarField;

const RESOLUTIONS: [usize; 3] = [65, 257, 513];

fn flat(res: usize) -> ScalarField {
    ScalarField::from_fn(res, res, |_, _| 0.5)
}

fn border_apply_benches(c: &mut Criterion) {
    let border = WorldBorder::new(BorderSettings::default(), 42);

    let mut group = c.benchmark_group("border/apply_to_heights");
    for &res in &RESOLUTIONS {
        group.throughput(common::cells_throughput(res));
        group.bench_with_input(BenchmarkId::from_parameter(res), &res, |b, &res| {
            b.iter_batched(
                || flat(res),
                |mut heights| {
                    border.apply_to_heights(&mut heights);
                    black_box(heights.len());
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();

    let mut group = c.benchmark_group("border/apply_to_spawn_map");
    for &res in &RESOLUTIONS {
        group.throughput(common::cells_throughput(res));
        group.bench_with_input(BenchmarkId::from_parameter(res), &res, |b, &res| {
            b.iter_batched(
                || flat(res),
                |mut mask| {
                    border.apply_to_spawn_map(&mut mask);
                    black_box(mask.len());
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn border_radius_benches(c: &mut Criterion) {
    let border = WorldBorder::new(BorderSettings::default(), 42);
    let mut group = c.benchmark_group("border/border_radius");
    group.throughput(common::elements_throughput(360));
    group.bench_function("full_turn", |b| {
        b.iter(|| {
            let mut acc = 0.0f32;
            for deg in 0..360 {
                let angle = (deg as f32 - 180.0).to_radians();
                acc += border.border_radius(black_box(angle));
            }
            black_box(acc);
        });
    });
    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = border_apply_benches, border_radius_benches
}
criterion_main!(benches);
