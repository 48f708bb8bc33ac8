/// Profiler friendly version of a fully-periodic forward/backward round trip.
use criterion::{criterion_group, criterion_main, Criterion};

use specfft::{IndexBox, R2CEngine, R2CInfo};

fn roundtrip() {
    let domain = IndexBox::from_dims([64, 64, 64], 3).unwrap();
    let engine = R2CEngine::new(domain, R2CInfo { batch_mode: false }).unwrap();

    let n = domain.volume() as usize;
    let input: Vec<f64> = (0..n).map(|i| (i as f64).sin()).collect();
    let mut output = vec![0.0; n];

    for _ in 0..3 {
        let spectral = engine.forward(&input).unwrap();
        engine.backward(&spectral, &mut output).unwrap();
    }
}

fn my_benchmark(c: &mut Criterion) {
    c.bench_function("r2c_roundtrip_64_cubed", |b| b.iter(|| roundtrip()));
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = my_benchmark
}
criterion_main!(benches);
