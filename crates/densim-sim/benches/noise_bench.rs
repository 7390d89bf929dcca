//! Benchmarks for noisy density-matrix simulation
//!
//! Run with: cargo bench -p densim-sim

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use densim_ir::Circuit;
use densim_sim::{DeterministicNoiseSimulator, NoiseApplication, SimulatorConfig};

fn simulator(p: f64, application: NoiseApplication) -> DeterministicNoiseSimulator {
    let config = SimulatorConfig::default()
        .with_noise_probability(p)
        .with_application(application)
        .with_seed(0);
    DeterministicNoiseSimulator::new(config).unwrap()
}

/// Benchmark the noiseless baseline
fn bench_noiseless(c: &mut Criterion) {
    let mut group = c.benchmark_group("noiseless");
    let sim = simulator(0.0, NoiseApplication::Direct);

    for num_qubits in &[4, 8, 12] {
        let circuit = Circuit::ghz(*num_qubits).unwrap();
        group.bench_with_input(BenchmarkId::new("ghz", num_qubits), &circuit, |b, circuit| {
            b.iter(|| sim.simulate(black_box(circuit)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark GHZ preparation under the default channels
fn bench_noisy_ghz(c: &mut Criterion) {
    let mut group = c.benchmark_group("noisy_ghz");

    for num_qubits in &[4, 8, 12] {
        let circuit = Circuit::ghz(*num_qubits).unwrap();
        for (label, application) in [
            ("direct", NoiseApplication::Direct),
            ("sequential", NoiseApplication::Sequential),
        ] {
            let sim = simulator(0.01, application);
            group.bench_with_input(BenchmarkId::new(label, num_qubits), &circuit, |b, circuit| {
                b.iter(|| sim.simulate(black_box(circuit)).unwrap());
            });
        }
    }

    group.finish();
}

/// Benchmark QFT, whose rotations defeat most node sharing
fn bench_noisy_qft(c: &mut Criterion) {
    let mut group = c.benchmark_group("noisy_qft");
    group.sample_size(20);

    for num_qubits in &[3, 5, 7] {
        let circuit = Circuit::qft(*num_qubits).unwrap();
        for (label, application) in [
            ("direct", NoiseApplication::Direct),
            ("sequential", NoiseApplication::Sequential),
        ] {
            let sim = simulator(0.01, application);
            group.bench_with_input(BenchmarkId::new(label, num_qubits), &circuit, |b, circuit| {
                b.iter(|| sim.simulate(black_box(circuit)).unwrap());
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_noiseless, bench_noisy_ghz, bench_noisy_qft);
criterion_main!(benches);
