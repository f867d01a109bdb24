//! Integration tests for the demo suite.
//!
//! These exercise the shared setup path the binaries use, end to end, on
//! small budgets so they stay fast.

use approx::assert_abs_diff_eq;
use clap::Parser;

use qexcite_algo::{EnergyPath, RunConfig, Ssvqe, Vqd, classical_solver};
use qexcite_demos::setup::{CommonArgs, build_ansatz, build_executor};

#[derive(Parser)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

fn cli(args: &[&str]) -> CommonArgs {
    let mut argv = vec!["demo"];
    argv.extend_from_slice(args);
    Cli::parse_from(argv).common
}

#[test]
fn test_builtin_models() {
    let config = RunConfig::default();

    let (_, toy) = cli(&[]).hamiltonian(&config).unwrap();
    assert_eq!(toy.num_qubits(), 2);
    assert_eq!(toy.num_terms(), 2);

    let (name, bcs) = cli(&["--hamiltonian", "bcs", "--levels", "3"])
        .hamiltonian(&config)
        .unwrap();
    assert!(name.contains('3'));
    assert_eq!(bcs.num_qubits(), 3);

    assert!(cli(&["--hamiltonian", "bcs", "--levels", "0"])
        .hamiltonian(&config)
        .is_err());
}

#[test]
fn test_configured_terms_take_precedence() {
    let config = RunConfig::from_yaml_str(
        r#"
hamiltonian:
  - label: "XI"
    coefficient: 1.0
"#,
    )
    .unwrap();

    let (name, h) = cli(&["--hamiltonian", "bcs"]).hamiltonian(&config).unwrap();
    assert_eq!(name, "configured");
    let spectrum = classical_solver(&h).unwrap();
    assert_abs_diff_eq!(spectrum.energies[0], -1.0, epsilon = 1e-9);
}

#[test]
fn test_executor_follows_backend_settings() {
    let mut config = RunConfig::default();
    cli(&["--shots", "256", "--seed", "4"]).apply(&mut config);

    let executor = build_executor(&config).unwrap();
    assert_eq!(executor.shots(), 256);
    assert_eq!(executor.energy_path(), EnergyPath::Sampled);

    config.backend.managed_expectation = true;
    let managed = build_executor(&config).unwrap();
    assert_eq!(managed.energy_path(), EnergyPath::Managed);
}

#[test]
fn test_vqd_pipeline_runs_from_config() {
    let mut config = RunConfig::default();
    config.vqd.beta = Some(3.0);
    config.optimizer.maxiter = 5;
    cli(&["--shots", "200", "--seed", "11"]).apply(&mut config);

    let (_, hamiltonian) = cli(&[]).hamiltonian(&config).unwrap();
    let ansatz = build_ansatz(&config, &hamiltonian).unwrap();
    let mut vqd = Vqd::new(
        hamiltonian,
        ansatz,
        config.build_optimizer().unwrap(),
        build_executor(&config).unwrap(),
        config.vqd_config().unwrap(),
    )
    .unwrap();

    let mut seen = Vec::new();
    vqd.run_with_progress(|index, _| seen.push(index)).unwrap();
    assert_eq!(seen, vec![0, 1]);
    assert!(vqd.energies().iter().all(|e| e.is_finite()));
    assert_eq!(vqd.sampled_energies().len(), 2);
}

#[test]
fn test_ssvqe_pipeline_runs_from_config() {
    let mut config = RunConfig::default();
    config.optimizer.maxiter = 5;
    cli(&["--shots", "200", "--seed", "12"]).apply(&mut config);

    let (_, hamiltonian) = cli(&[]).hamiltonian(&config).unwrap();
    let ansatz = build_ansatz(&config, &hamiltonian).unwrap();
    let ssvqe = Ssvqe::new(
        hamiltonian,
        ansatz,
        config.build_optimizer().unwrap(),
        build_executor(&config).unwrap(),
        config.ssvqe_config(),
    )
    .unwrap();

    assert_eq!(ssvqe.weights(), [2.0, 1.0]);
    let (energy, state) = ssvqe.run(1).unwrap();
    assert!(energy.is_finite());
    assert_eq!(state.name(), "ssvqe_basis_1");
}
