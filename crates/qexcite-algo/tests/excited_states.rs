//! End-to-end excited-state searches on a seeded shot simulator.
//!
//! The model is ½·Z⊗I + ½·Z⊗Z with spectrum {−1, 0, 0, 1}. Energies must
//! agree with exact diagonalization to one decimal place.

use std::sync::Arc;

use approx::assert_abs_diff_eq;

use qexcite_adapter_sim::SimulatorBackend;
use qexcite_algo::hamiltonians::two_qubit_toy;
use qexcite_algo::{
    Ansatz, Executor, NelderMead, OverlapMethod, Ssvqe, SsvqeConfig, Vqd, VqdConfig,
    classical_solver,
};

const SHOTS: u32 = 10_000;
const TOLERANCE: f64 = 0.15;

fn executor(seed: u64) -> Executor {
    Executor::new(Arc::new(SimulatorBackend::new().with_seed(seed)), SHOTS).unwrap()
}

fn run_vqd(overlap: OverlapMethod) -> Vec<f64> {
    searched_vqd(overlap).energies()
}

fn searched_vqd(overlap: OverlapMethod) -> Vqd<NelderMead> {
    let mut vqd = Vqd::new(
        two_qubit_toy().unwrap(),
        Ansatz::two_local(2, 2).unwrap(),
        NelderMead::new().with_maxiter(1_000),
        executor(21),
        VqdConfig::new(1, 3.0).with_overlap(overlap).with_seed(17),
    )
    .unwrap();
    vqd.run().unwrap();
    vqd
}

#[test]
fn test_vqd_swap_matches_exact_spectrum() {
    let exact = classical_solver(&two_qubit_toy().unwrap()).unwrap();
    let found = run_vqd(OverlapMethod::Swap);

    assert_eq!(found.len(), 2);
    assert_abs_diff_eq!(found[0], exact.energies[0], epsilon = TOLERANCE);
    assert_abs_diff_eq!(found[1], exact.energies[1], epsilon = TOLERANCE);
}

#[test]
fn test_vqd_unpenalized_energies_match_exact_spectrum() {
    let exact = classical_solver(&two_qubit_toy().unwrap()).unwrap();
    let vqd = searched_vqd(OverlapMethod::Swap);
    let sampled = vqd.sampled_energies();

    assert_abs_diff_eq!(sampled[0], exact.energies[0], epsilon = TOLERANCE);
    assert_abs_diff_eq!(sampled[1], exact.energies[1], epsilon = TOLERANCE);
    // Only the excited state carries a penalty.
    let ground = &vqd.accepted()[0];
    assert_abs_diff_eq!(ground.energy, ground.sampled_energy, epsilon = 0.05);
}

#[test]
fn test_vqd_destructive_swap_matches_exact_spectrum() {
    let exact = classical_solver(&two_qubit_toy().unwrap()).unwrap();
    let found = run_vqd(OverlapMethod::DestructiveSwap);

    assert_abs_diff_eq!(found[0], exact.energies[0], epsilon = TOLERANCE);
    assert_abs_diff_eq!(found[1], exact.energies[1], epsilon = TOLERANCE);
}

#[test]
fn test_vqd_with_managed_energies() {
    // Energies come from the statevector; only the overlaps are sampled.
    let sim = SimulatorBackend::new().with_seed(5).with_managed_expectation();
    let exec = Executor::new(Arc::new(sim), SHOTS).unwrap();
    let mut vqd = Vqd::new(
        two_qubit_toy().unwrap(),
        Ansatz::two_local(2, 2).unwrap(),
        NelderMead::new().with_maxiter(1_000),
        exec,
        VqdConfig::new(1, 3.0).with_seed(3),
    )
    .unwrap();
    vqd.run().unwrap();

    let energies = vqd.energies();
    assert_abs_diff_eq!(energies[0], -1.0, epsilon = TOLERANCE);
    assert_abs_diff_eq!(energies[1], 0.0, epsilon = TOLERANCE);
}

fn trained_ssvqe() -> Ssvqe {
    Ssvqe::new(
        two_qubit_toy().unwrap(),
        Ansatz::two_local(2, 2).unwrap(),
        NelderMead::new().with_maxiter(1_000),
        executor(33),
        SsvqeConfig::new(2).with_seed(8),
    )
    .unwrap()
}

#[test]
fn test_ssvqe_matches_exact_spectrum() {
    let exact = classical_solver(&two_qubit_toy().unwrap()).unwrap();
    let ssvqe = trained_ssvqe();

    let (e0, _) = ssvqe.run(0).unwrap();
    let (e1, _) = ssvqe.run(1).unwrap();
    assert_abs_diff_eq!(e0, exact.energies[0], epsilon = TOLERANCE);
    assert_abs_diff_eq!(e1, exact.energies[1], epsilon = TOLERANCE);
}

#[test]
fn test_ssvqe_run_is_idempotent() {
    let ssvqe = trained_ssvqe();

    let (first_energy, first_state) = ssvqe.run(1).unwrap();
    let (second_energy, second_state) = ssvqe.run(1).unwrap();

    assert_eq!(
        format!("{:?}", first_state.instructions().unwrap()),
        format!("{:?}", second_state.instructions().unwrap())
    );
    assert_abs_diff_eq!(first_energy, second_energy, epsilon = 0.05);
    assert_eq!(ssvqe.energies().unwrap().len(), 2);
}
