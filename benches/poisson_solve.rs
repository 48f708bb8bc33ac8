/// Profiler friendly version of a periodic-periodic-Neumann Poisson solve.
use criterion::{criterion_group, criterion_main, Criterion};

use specfft::{Geometry, IndexBox, PoissonHybridSolver};

fn solve() {
    let domain = IndexBox::from_dims([64, 64, 64], 3).unwrap();
    let geom = Geometry {
        domain,
        delta: [1.0, 1.0, 1.0],
    };
    let solver = PoissonHybridSolver::new(geom).unwrap();

    let n = domain.volume() as usize;
    let rhs: Vec<f64> = (0..n).map(|i| (i as f64 * 0.01).cos()).collect();
    let mut soln = vec![0.0; n];

    for _ in 0..3 {
        solver.solve(&rhs, &mut soln).unwrap();
    }
}

fn my_benchmark(c: &mut Criterion) {
    c.bench_function("poisson_hybrid_solve_64_cubed", |b| b.iter(|| solve()));
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = my_benchmark
}
criterion_main!(benches);
