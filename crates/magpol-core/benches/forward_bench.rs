// ─────────────────────────────────────────────────────────────────────
// SCPN MagPol Core — Forward Operator Benchmark
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

use criterion::{criterion_group, criterion_main, Criterion};
use magpol_core::inversion::{Inversion, NoiseFloor};
use magpol_core::receiver::Receiver;
use magpol_core::simulation::Simulation;
use magpol_core::source::{ControlledSource, Source, UniformSource};
use magpol_core::survey::Survey;
use magpol_types::component::Component;
use magpol_types::config::SolveSchedule;
use ndarray::{array, Array1, Array2};
use std::hint::black_box;

fn cell_grid(nx: usize, ny: usize, nz: usize) -> Array2<f64> {
    let mut cells = Array2::zeros((nx * ny * nz, 3));
    let mut i = 0;
    for ix in 0..nx {
        for iy in 0..ny {
            for iz in 0..nz {
                cells[[i, 0]] = ix as f64 * 0.5;
                cells[[i, 1]] = iy as f64 * 0.5;
                cells[[i, 2]] = -1.0 - iz as f64 * 0.5;
                i += 1;
            }
        }
    }
    cells
}

fn surface_receiver(n_side: usize) -> Receiver {
    let mut locs = Array2::zeros((n_side * n_side, 3));
    for ix in 0..n_side {
        for iy in 0..n_side {
            let i = ix * n_side + iy;
            locs[[i, 0]] = -1.0 + ix as f64 * 0.4;
            locs[[i, 1]] = -1.0 + iy as f64 * 0.4;
            locs[[i, 2]] = 0.2;
        }
    }
    Receiver::new(locs, None, None).expect("valid receiver grid")
}

fn build_simulation(n_cells_side: usize, n_rx_side: usize) -> Simulation {
    let loop_nodes = array![
        [-4.0, -4.0, 0.5],
        [4.0, -4.0, 0.5],
        [4.0, 4.0, 0.5],
        [-4.0, 4.0, 0.5],
        [-4.0, -4.0, 0.5]
    ];
    let controlled = Source::Controlled(
        ControlledSource::new(vec![surface_receiver(n_rx_side)], loop_nodes, Some(10.0))
            .expect("valid transmitter loop"),
    );
    let uniform = Source::Uniform(UniformSource::new(
        vec![surface_receiver(n_rx_side)],
        Component::Z,
        Some(1.0),
    ));
    let survey = Survey::new(vec![controlled, uniform]);
    Simulation::new(cell_grid(n_cells_side, n_cells_side, 2), survey, None)
        .expect("valid simulation geometry")
}

fn bench_sensitivity_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("sensitivity_assembly");
    group.sample_size(10);

    for n_side in [3usize, 5usize] {
        group.bench_function(format!("cells_{}x{}x2", n_side, n_side), |b| {
            b.iter(|| {
                let mut sim = build_simulation(n_side, 6);
                let g = sim.sensitivities().expect("assembly should succeed");
                black_box(g.len());
            })
        });
    }

    group.finish();
}

fn bench_forward_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward_prediction");
    group.sample_size(20);

    let mut sim = build_simulation(5, 6);
    let n_params = sim.mapping().n_params();
    sim.sensitivities().expect("assembly should succeed");
    let model = Array1::from_elem(n_params, 0.5);

    group.bench_function("dpred_cached_g", |b| {
        b.iter(|| {
            let predicted = sim.dpred(&model).expect("forward prediction should succeed");
            black_box(predicted[0]);
        })
    });

    group.finish();
}

fn bench_inversion_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("inversion_solve");
    group.sample_size(10);

    let mut sim = build_simulation(3, 6);
    let n_params = sim.mapping().n_params();
    let mut model = Array1::zeros(n_params);
    model[2] = 1.0;
    let observed = sim.dpred(&model).expect("forward prediction should succeed");

    group.bench_function("damped_normal_equations", |b| {
        b.iter(|| {
            let mut inversion = Inversion::new(
                build_simulation(3, 6),
                observed.clone(),
                NoiseFloor::Uniform(0.01),
                Some(1e-6),
            )
            .expect("valid inversion setup");
            let schedule = SolveSchedule::default();
            let recovered = inversion.solve(&schedule).expect("solve should succeed");
            black_box(recovered[0]);
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_sensitivity_assembly,
    bench_forward_prediction,
    bench_inversion_solve
);
criterion_main!(benches);
