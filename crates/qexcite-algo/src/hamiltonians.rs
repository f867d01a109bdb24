//! Model Hamiltonians used by the demos and tests.

use qexcite_ir::{Pauli, PauliHamiltonian, PauliTerm};

use crate::error::{AlgoError, AlgoResult};

/// ½·Z⊗I + ½·Z⊗Z, with eigenvalues {−1, 0, 0, 1}.
///
/// The ground state is qubit 1 in |1⟩ and qubit 0 in |0⟩.
pub fn two_qubit_toy() -> AlgoResult<PauliHamiltonian> {
    let terms = vec![PauliTerm::z(0.5, 1), PauliTerm::zz(0.5, 0, 1)];
    Ok(PauliHamiltonian::new(2, terms)?)
}

/// Reduced BCS pairing model.
///
/// H = Σᵢ (εᵢ/2)·Zᵢ + v·(½·X⊗…⊗X + ½·Y⊗…⊗Y), one qubit per level.
pub fn bcs_hamiltonian(epsilons: &[f64], v: f64) -> AlgoResult<PauliHamiltonian> {
    if epsilons.is_empty() {
        return Err(AlgoError::InvalidInput("BCS model needs at least one level".into()));
    }
    if !v.is_finite() || epsilons.iter().any(|e| !e.is_finite()) {
        return Err(AlgoError::InvalidInput("BCS parameters must be finite".into()));
    }
    let n = epsilons.len();
    let mut terms: Vec<PauliTerm> = epsilons
        .iter()
        .enumerate()
        .map(|(q, e)| PauliTerm::z(e / 2.0, q))
        .collect();
    if v != 0.0 {
        for pauli in [Pauli::X, Pauli::Y] {
            terms.push(PauliTerm::new(0.5 * v, (0..n).map(|q| (q, pauli)).collect()));
        }
    }
    Ok(PauliHamiltonian::new(n, terms)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classical::classical_solver;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_toy_spectrum() {
        let spectrum = classical_solver(&two_qubit_toy().unwrap()).unwrap();
        assert_abs_diff_eq!(spectrum.energies[0], -1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(spectrum.energies[3], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_bcs_terms() {
        let h = bcs_hamiltonian(&[1.0, 2.0], 1.0).unwrap();
        assert_eq!(h.num_qubits(), 2);
        assert_eq!(h.num_terms(), 4);
        assert_eq!(h.terms()[2].label(2), "XX");
        assert_eq!(h.terms()[3].label(2), "YY");
    }

    #[test]
    fn test_bcs_two_level_spectrum() {
        // In the {01, 10} block, ½(XX + YY) hops the pair with amplitude 1.
        let h = bcs_hamiltonian(&[1.0, 1.0], 1.0).unwrap();
        let spectrum = classical_solver(&h).unwrap();
        let expected = [-1.0, -1.0, 1.0, 1.0];
        for (e, x) in spectrum.energies.iter().zip(expected) {
            assert_abs_diff_eq!(*e, x, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_bcs_rejects_empty() {
        assert!(bcs_hamiltonian(&[], 1.0).is_err());
    }
}
