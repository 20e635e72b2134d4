//! # Route Optimiser Benchmark

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Vector3;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::rc::Rc;

use nav_lib::{
    auto::route_opt::{solve, LegMatrix, RouteOptParams, RouteOptimizer},
    sim::StraightLinePaths,
};

fn random_targets(rng: &mut StdRng, num: usize) -> Vec<Vector3<f64>> {
    (0..num)
        .map(|_| Vector3::new(rng.gen_range(-50.0..50.0), 0.0, rng.gen_range(-50.0..50.0)))
        .collect()
}

fn route_opt_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let start = Vector3::zeros();
    let provider = StraightLinePaths;

    // ---- Exhaustive search only ----

    let mut group = c.benchmark_group("route_opt::solve");
    for num in [4, 6, 8, 9].iter() {
        let targets = random_targets(&mut rng, *num);
        let legs = LegMatrix::new(&provider, &start, &targets, Some(&start));

        group.bench_with_input(BenchmarkId::from_parameter(num), &legs, |b, legs| {
            b.iter(|| solve(legs))
        });
    }
    group.finish();

    // ---- Full optimisation including the leg matrix ----

    let optimiser = RouteOptimizer::new(RouteOptParams::default(), Rc::new(StraightLinePaths));
    let targets = random_targets(&mut rng, 8);

    c.bench_function("RouteOptimizer::optimise", |b| {
        b.iter(|| optimiser.optimise(&start, &targets, None))
    });
}

criterion_group!(benches, route_opt_benchmark);
criterion_main!(benches);
