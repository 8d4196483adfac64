//! Dynamics benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use std::f64::consts::PI;

use glam::DVec3;
use tether_sim::{ChainState, Parameters, ReelSchedule, SpringForceModel, TetherSolver};

fn bench_reel_schedule(c: &mut Criterion) {
    let params = Parameters::default();
    let schedule = ReelSchedule::new(&params.tether);

    c.bench_function("reel_schedule", |b| {
        b.iter(|| schedule.at(black_box(4.2)))
    });
}

fn bench_accelerations(c: &mut Criterion) {
    let params = Parameters::default();
    let chain = ChainState::along_elevation(50.0, PI / 10.0, 20).unwrap();
    let schedule = ReelSchedule::new(&params.tether);
    let model = SpringForceModel::new(params.tether.gravity());
    let props = schedule.at(0.0);
    let mut acc = vec![DVec3::ZERO; chain.node_count()];

    c.bench_function("accelerations_20_segments", |b| {
        b.iter(|| {
            model
                .accelerations(
                    black_box(0.0),
                    &chain.positions_m,
                    &chain.velocities_m_per_sec,
                    &props,
                    &mut acc,
                )
                .unwrap()
        })
    });
}

fn bench_short_solve(c: &mut Criterion) {
    let mut params = Parameters::default();
    params.simulation.duration_sec = 0.5;
    params.simulation.abs_tolerance = 1e-4;
    params.simulation.rel_tolerance = 1e-4;

    c.bench_function("solve_half_second", |b| {
        b.iter(|| {
            let mut solver = TetherSolver::new(black_box(&params)).unwrap();
            solver.solve().unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_reel_schedule,
    bench_accelerations,
    bench_short_solve
);
criterion_main!(benches);
