//! End-to-end runs of the prebuilt circuits and configuration loading.

use densim_ir::{Circuit, QubitId};
use densim_sim::{
    DeterministicNoiseSimulator, NoiseApplication, ReportConfig, SimError, SimulatorConfig,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn full_state() -> ReportConfig {
    ReportConfig {
        threshold: 1e-12,
        max_states: 256,
        full_state: true,
    }
}

// ---------------------------------------------------------------------------
// Noiseless
// ---------------------------------------------------------------------------

#[test]
fn qft_of_zero_is_uniform() {
    let circuit = Circuit::qft(3).unwrap();
    let sim = DeterministicNoiseSimulator::default();
    let out = sim.simulate(&circuit).unwrap();
    assert_eq!(out.len(), 8);
    for p in out.values() {
        assert!((p - 0.125).abs() < 1e-12);
    }
}

#[test]
fn ghz_has_two_branches() {
    let circuit = Circuit::ghz(5).unwrap();
    let out = DeterministicNoiseSimulator::default().simulate(&circuit).unwrap();
    assert_eq!(out.len(), 2);
    assert!((out["00000"] - 0.5).abs() < 1e-12);
    assert!((out["11111"] - 0.5).abs() < 1e-12);
}

#[test]
fn controlled_swap_moves_excitation() {
    let mut circuit = Circuit::with_size("fredkin", 3, 0);
    circuit
        .x(QubitId(0))
        .unwrap()
        .x(QubitId(1))
        .unwrap()
        .cswap(QubitId(0), QubitId(1), QubitId(2))
        .unwrap();
    let out = DeterministicNoiseSimulator::default().simulate(&circuit).unwrap();
    assert!((out["101"] - 1.0).abs() < 1e-12);
}

// ---------------------------------------------------------------------------
// Noisy
// ---------------------------------------------------------------------------

#[test]
fn noisy_ghz_spreads_but_sums_to_one() {
    init_tracing();
    let config = SimulatorConfig::default()
        .with_noise_probability(0.01)
        .with_report(full_state());
    let sim = DeterministicNoiseSimulator::new(config).unwrap();
    let out = sim.simulate(&Circuit::ghz(4).unwrap()).unwrap();

    let total: f64 = out.values().sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(out.len() > 2);
    // Amplitude damping favours the ground branch.
    assert!(out["0000"] > out["1111"]);
    assert!(out["1111"] > 0.35);
}

#[test]
fn noisy_runs_are_reproducible() {
    let config = SimulatorConfig::default()
        .with_noise_probability(0.02)
        .with_seed(11)
        .with_report(full_state());
    let sim = DeterministicNoiseSimulator::new(config).unwrap();
    let circuit = Circuit::qft(3).unwrap();
    assert_eq!(sim.simulate(&circuit).unwrap(), sim.simulate(&circuit).unwrap());
}

#[test]
fn sequential_mode_on_qft() {
    let base = SimulatorConfig::default()
        .with_noise_probability(0.01)
        .with_report(full_state());
    let circuit = Circuit::qft(3).unwrap();
    let direct = DeterministicNoiseSimulator::new(base.clone())
        .unwrap()
        .simulate(&circuit)
        .unwrap();
    let sequential =
        DeterministicNoiseSimulator::new(base.with_application(NoiseApplication::Sequential))
            .unwrap()
            .simulate(&circuit)
            .unwrap();
    assert_eq!(direct.len(), sequential.len());
    for (key, p) in &direct {
        assert!((p - sequential[key]).abs() < 1e-9, "{key}");
    }
}

#[test]
fn scratch_cache_is_balanced_after_noisy_run() {
    init_tracing();
    let config = SimulatorConfig::default().with_noise_probability(0.05);
    let sim = DeterministicNoiseSimulator::new(config).unwrap();
    let mut session = sim.session(3);
    session.run(&Circuit::qft(3).unwrap()).unwrap();
    assert_eq!(session.occupancy(), 0);
    assert!(session.package().cache().peak() > 0);
    assert!(session.statistics().noise_lookups > 0);
}

#[test]
fn simulator_rejects_invalid_config() {
    let config = SimulatorConfig::default().with_noise_probability(-0.1);
    assert!(matches!(
        DeterministicNoiseSimulator::new(config),
        Err(SimError::InvalidNoiseProbability(_))
    ));
}

// ---------------------------------------------------------------------------
// Configuration files
// ---------------------------------------------------------------------------

#[test]
fn config_from_yaml_file() {
    let path = std::env::temp_dir().join(format!("densim-config-{}.yaml", std::process::id()));
    std::fs::write(
        &path,
        "noise:\n  probability: 0.05\n  channels: D\n  memoize: false\nuse_density_marker: false\nreport:\n  threshold: 0.001\n",
    )
    .unwrap();

    let config = SimulatorConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.noise.probability, 0.05);
    assert_eq!(config.noise.channels.to_string(), "D");
    assert!(!config.noise.memoize);
    assert!(!config.use_density_marker);
    assert_eq!(config.report.threshold, 0.001);
    assert_eq!(config.report.max_states, 256);

    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"channels\":\"D\""));
}

#[test]
fn config_from_missing_file() {
    let err = SimulatorConfig::from_file("/nonexistent/densim.yaml").unwrap_err();
    assert!(matches!(err, SimError::Config(_)));
}

#[test]
fn config_file_is_validated() {
    let err = SimulatorConfig::from_yaml("noise:\n  probability: 0.9\n").unwrap_err();
    assert!(matches!(err, SimError::InvalidNoiseProbability(_)));
}
