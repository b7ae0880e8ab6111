//! # Heading Estimator Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mow_lib::{
    eqpt::{Drivetrain, InertialSource},
    heading_est::HeadingEstimator,
    sim::{SimMower, SimParams},
};

fn heading_est_benchmark(c: &mut Criterion) {
    // ---- Build a slowly pivoting simulated mower ----

    let mut sim = SimMower::new(SimParams::default());
    sim.set_pose([5.0, 5.0], 45.0);
    sim.set_speed(60, -60);

    let samples: Vec<_> = (0..1000)
        .map(|_| {
            sim.step(0.05);
            sim.read_inertial().unwrap()
        })
        .collect();

    // Full update, the first read from the sim lets the estimator see the magnetometer
    let mut est = HeadingEstimator::default();
    est.update(&mut sim, 0.05).unwrap();
    c.bench_function("HeadingEstimator::update_with_sample", |b| {
        b.iter(|| {
            for s in samples.iter() {
                est.update_with_sample(black_box(s), 0.05).unwrap();
            }
        })
    });

    // Reading straight from the simulation
    let mut est = HeadingEstimator::default();
    c.bench_function("HeadingEstimator::update::sim", |b| {
        b.iter(|| est.update(&mut sim, black_box(0.05)).unwrap())
    });
}

criterion_group!(benches, heading_est_benchmark);
criterion_main!(benches);
