//! Hamiltonian expectation values from measurement counts.
//!
//! In shot mode the Hamiltonian's terms are packed greedily into
//! qubit-wise commuting groups. Each group is measured once after rotating
//! every qubit into the eigenbasis of its Pauli factor (X → H, Y → S†·H,
//! Z → nothing). A term's expectation is the average parity of its qubits.

use tracing::debug;

use qexcite_hal::Counts;
use qexcite_ir::{Circuit, ClbitId, Pauli, PauliHamiltonian, PauliTerm, QubitId};

use crate::error::{AlgoError, AlgoResult};
use crate::executor::{EnergyPath, Executor};

/// Terms that can be read from one measurement setting.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementGroup {
    /// Measurement basis per qubit; `Pauli::I` means the qubit is not read.
    pub basis: Vec<Pauli>,
    /// Indices into [`PauliHamiltonian::terms`].
    pub terms: Vec<usize>,
}

impl MeasurementGroup {
    fn accepts(&self, term: &PauliTerm) -> bool {
        term.operators
            .iter()
            .all(|(q, p)| self.basis[*q] == Pauli::I || self.basis[*q] == *p)
    }

    fn absorb(&mut self, index: usize, term: &PauliTerm) {
        for (q, p) in &term.operators {
            self.basis[*q] = *p;
        }
        self.terms.push(index);
    }
}

/// Greedily partition the non-identity terms into qubit-wise commuting groups.
pub fn group_terms(hamiltonian: &PauliHamiltonian) -> Vec<MeasurementGroup> {
    let mut groups: Vec<MeasurementGroup> = Vec::new();
    for (index, term) in hamiltonian.terms().iter().enumerate() {
        if term.is_identity() {
            continue;
        }
        match groups.iter_mut().find(|g| g.accepts(term)) {
            Some(group) => group.absorb(index, term),
            None => {
                let mut group = MeasurementGroup {
                    basis: vec![Pauli::I; hamiltonian.num_qubits()],
                    terms: Vec::new(),
                };
                group.absorb(index, term);
                groups.push(group);
            }
        }
    }
    groups
}

/// `state` followed by basis rotations and measurement of every read qubit.
///
/// Qubit `q` is recorded in classical bit `q`.
pub fn measurement_circuit(state: &Circuit, basis: &[Pauli]) -> AlgoResult<Circuit> {
    if basis.len() != state.num_qubits() {
        return Err(AlgoError::InvalidInput(format!(
            "measurement basis covers {} qubits, state has {}",
            basis.len(),
            state.num_qubits()
        )));
    }
    let n = state.num_qubits() as u32;
    let mut circuit = Circuit::with_size(format!("{}_meas", state.name()), n, n);
    circuit.append(state, 0)?;
    for (q, pauli) in basis.iter().enumerate() {
        let qubit = QubitId(q as u32);
        match pauli {
            Pauli::I => continue,
            Pauli::Z => {}
            Pauli::X => {
                circuit.h(qubit)?;
            }
            Pauli::Y => {
                circuit.sdg(qubit)?.h(qubit)?;
            }
        }
        circuit.measure(qubit, ClbitId(q as u32))?;
    }
    Ok(circuit)
}

/// Average of (−1)^parity over the term's qubits, read from classical bit = qubit.
///
/// Empty counts give zero.
pub fn term_expectation(term: &PauliTerm, counts: &Counts) -> f64 {
    let total = counts.total_shots();
    if total == 0 {
        return 0.0;
    }
    let mut acc: i64 = 0;
    for (bitstring, count) in counts.iter() {
        let bits = bitstring.as_bytes();
        let odd = term
            .qubits()
            .filter(|&q| bits.get(q) == Some(&b'1'))
            .count()
            % 2
            == 1;
        let count = count as i64;
        acc += if odd { -count } else { count };
    }
    acc as f64 / total as f64
}

/// ⟨ψ|H|ψ⟩ for the state prepared by `state`.
///
/// Uses the executor's resolved [`EnergyPath`].
pub fn sample_hamiltonian(
    hamiltonian: &PauliHamiltonian,
    executor: &Executor,
    state: &Circuit,
) -> AlgoResult<f64> {
    if hamiltonian.num_qubits() != state.num_qubits() {
        return Err(AlgoError::InvalidInput(format!(
            "Hamiltonian acts on {} qubits, state has {}",
            hamiltonian.num_qubits(),
            state.num_qubits()
        )));
    }
    if executor.energy_path() == EnergyPath::Managed {
        return executor.expectation(hamiltonian, state);
    }

    let mut energy = hamiltonian.identity_coefficient();
    for group in group_terms(hamiltonian) {
        let circuit = measurement_circuit(state, &group.basis)?;
        let counts = executor.run_counts(&circuit)?;
        for &index in &group.terms {
            let term = &hamiltonian.terms()[index];
            energy += term.coefficient * term_expectation(term, &counts);
        }
    }
    debug!(circuit = state.name(), energy, "sampled energy");
    Ok(energy)
}

/// Expectation of one Pauli string such as `"XX"` (rightmost character on qubit 0).
pub fn measure_pauli_string(label: &str, state: &Circuit, executor: &Executor) -> AlgoResult<f64> {
    let term = PauliTerm::from_label(label, 1.0)?;
    if label.chars().count() != state.num_qubits() {
        return Err(AlgoError::InvalidInput(format!(
            "label '{label}' does not match a {}-qubit state",
            state.num_qubits()
        )));
    }
    if term.is_identity() {
        return Ok(1.0);
    }
    let basis: Vec<Pauli> = (0..state.num_qubits()).map(|q| term.pauli_on(q)).collect();
    let counts = executor.run_counts(&measurement_circuit(state, &basis)?)?;
    Ok(term_expectation(&term, &counts))
}

/// ⟨Z⊗Z⟩ on a two-qubit state.
pub fn measure_zz(state: &Circuit, executor: &Executor) -> AlgoResult<f64> {
    measure_pauli_string("ZZ", state, executor)
}

/// ⟨Z⊗I⟩, i.e. Z on qubit 1.
pub fn measure_zi(state: &Circuit, executor: &Executor) -> AlgoResult<f64> {
    measure_pauli_string("ZI", state, executor)
}

/// ⟨I⊗Z⟩, i.e. Z on qubit 0.
pub fn measure_iz(state: &Circuit, executor: &Executor) -> AlgoResult<f64> {
    measure_pauli_string("IZ", state, executor)
}

/// ⟨X⊗X⟩ on a two-qubit state.
pub fn measure_xx(state: &Circuit, executor: &Executor) -> AlgoResult<f64> {
    measure_pauli_string("XX", state, executor)
}

/// ⟨Y⊗Y⟩ on a two-qubit state.
pub fn measure_yy(state: &Circuit, executor: &Executor) -> AlgoResult<f64> {
    measure_pauli_string("YY", state, executor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qexcite_adapter_sim::SimulatorBackend;
    use std::sync::Arc;

    fn executor(seed: u64) -> Executor {
        Executor::new(Arc::new(SimulatorBackend::new().with_seed(seed)), 10_000).unwrap()
    }

    fn plus_plus() -> Circuit {
        let mut c = Circuit::with_size("plus_plus", 2, 0);
        c.h(QubitId(0)).unwrap().h(QubitId(1)).unwrap();
        c
    }

    fn circular_plus() -> Circuit {
        let mut c = Circuit::with_size("circular", 2, 0);
        for q in 0..2 {
            c.h(QubitId(q)).unwrap().s(QubitId(q)).unwrap();
        }
        c
    }

    #[test]
    fn test_zz_on_ground() {
        let state = Circuit::with_size("zero", 2, 0);
        assert_abs_diff_eq!(measure_zz(&state, &executor(1)).unwrap(), 1.0, epsilon = 0.02);
    }

    #[test]
    fn test_xx_on_plus_plus() {
        assert_abs_diff_eq!(measure_xx(&plus_plus(), &executor(2)).unwrap(), 1.0, epsilon = 0.02);
    }

    #[test]
    fn test_yy_on_circular_states() {
        assert_abs_diff_eq!(
            measure_yy(&circular_plus(), &executor(3)).unwrap(),
            1.0,
            epsilon = 0.02
        );
    }

    #[test]
    fn test_zi_reads_qubit_one() {
        let mut state = Circuit::with_size("q1", 2, 0);
        state.x(QubitId(1)).unwrap();
        let exec = executor(4);
        assert_abs_diff_eq!(measure_zi(&state, &exec).unwrap(), -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(measure_iz(&state, &exec).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_grouping_merges_commuting_terms() {
        let h = PauliHamiltonian::from_labels(&[("ZI", 0.5), ("ZZ", 0.5), ("XX", 1.0), ("II", 2.0)])
            .unwrap();
        let groups = group_terms(&h);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].terms, vec![0, 1]);
        assert_eq!(groups[0].basis, vec![Pauli::Z, Pauli::Z]);
        assert_eq!(groups[1].terms, vec![2]);
    }

    #[test]
    fn test_term_expectation_missing_keys() {
        let term = PauliTerm::zz(1.0, 0, 1);
        let mut counts = Counts::new();
        counts.insert("11", 30);
        counts.insert("10", 10);
        assert_abs_diff_eq!(term_expectation(&term, &counts), 0.5);
        assert_eq!(term_expectation(&term, &Counts::new()), 0.0);
    }

    #[test]
    fn test_sampled_energy_matches_exact() {
        let h = PauliHamiltonian::from_labels(&[("ZI", 0.5), ("ZZ", 0.5), ("II", 0.25)]).unwrap();
        let mut state = Circuit::with_size("q1", 2, 0);
        state.x(QubitId(1)).unwrap();
        let energy = sample_hamiltonian(&h, &executor(5), &state).unwrap();
        assert_abs_diff_eq!(energy, -0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_managed_path_is_exact() {
        let h = PauliHamiltonian::from_labels(&[("XX", 1.0), ("YY", 1.0)]).unwrap();
        let sim = SimulatorBackend::new().with_managed_expectation();
        let exec = Executor::new(Arc::new(sim), 100).unwrap();
        let energy = sample_hamiltonian(&h, &exec, &plus_plus()).unwrap();
        assert_abs_diff_eq!(energy, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_width_mismatch_is_invalid_input() {
        let h = PauliHamiltonian::from_labels(&[("ZZ", 1.0)]).unwrap();
        let state = Circuit::with_size("one", 1, 0);
        assert!(matches!(
            sample_hamiltonian(&h, &executor(6), &state),
            Err(AlgoError::InvalidInput(_))
        ));
    }
}
