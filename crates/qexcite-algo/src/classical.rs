//! Exact diagonalization of small Hamiltonians.
//!
//! Used as the reference spectrum for variational runs. The dense matrix
//! grows as 4ⁿ, so the solver refuses registers wider than
//! [`MAX_DENSE_QUBITS`].

use nalgebra::{DMatrix, SymmetricEigen};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use qexcite_ir::PauliHamiltonian;

use crate::error::{AlgoError, AlgoResult};

/// Widest register the dense solver accepts.
pub const MAX_DENSE_QUBITS: usize = 12;

const MAX_SWEEPS: usize = 10_000;

/// Eigenvalues in ascending order with their eigenvectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spectrum {
    /// Eigenvalues, lowest first.
    pub energies: Vec<f64>,
    /// `states[i]` is the normalized eigenvector of `energies[i]`, little-endian.
    pub states: Vec<Vec<Complex64>>,
}

impl Spectrum {
    /// Lowest eigenvalue.
    pub fn ground_energy(&self) -> Option<f64> {
        self.energies.first().copied()
    }

    /// Difference between the two lowest eigenvalues.
    pub fn gap(&self) -> Option<f64> {
        match self.energies.as_slice() {
            [e0, e1, ..] => Some(e1 - e0),
            _ => None,
        }
    }

    /// The `k` lowest eigenvalues.
    pub fn lowest(&self, k: usize) -> &[f64] {
        &self.energies[..k.min(self.energies.len())]
    }

    /// Number of eigenpairs.
    pub fn len(&self) -> usize {
        self.energies.len()
    }

    /// Whether the spectrum is empty.
    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }
}

/// Full eigendecomposition of `hamiltonian`.
///
/// Fails with [`AlgoError::Computation`] if the Hermitian solver does not
/// converge; partial spectra are never returned.
pub fn classical_solver(hamiltonian: &PauliHamiltonian) -> AlgoResult<Spectrum> {
    let n = hamiltonian.num_qubits();
    if n > MAX_DENSE_QUBITS {
        return Err(AlgoError::InvalidInput(format!(
            "dense diagonalization is limited to {MAX_DENSE_QUBITS} qubits, got {n}"
        )));
    }
    if let Some(term) = hamiltonian.terms().iter().find(|t| !t.coefficient.is_finite()) {
        return Err(AlgoError::InvalidInput(format!(
            "non-finite coefficient {} on {}",
            term.coefficient,
            term.label(n)
        )));
    }

    let dim = 1usize << n;
    let matrix = DMatrix::from_row_slice(dim, dim, &hamiltonian.to_matrix());
    let eigen = SymmetricEigen::try_new(matrix, f64::EPSILON, MAX_SWEEPS).ok_or_else(|| {
        AlgoError::Computation(format!(
            "Hermitian eigensolver did not converge for a {dim}×{dim} matrix"
        ))
    })?;

    let mut order: Vec<usize> = (0..dim).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

    let energies: Vec<f64> = order.iter().map(|&i| eigen.eigenvalues[i]).collect();
    let states = order
        .iter()
        .map(|&i| eigen.eigenvectors.column(i).iter().copied().collect())
        .collect();

    debug!(qubits = n, ground = energies.first().copied(), "classical spectrum");
    Ok(Spectrum { energies, states })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_diagonal_spectrum() {
        let h = PauliHamiltonian::from_labels(&[("ZI", 0.5), ("ZZ", 0.5)]).unwrap();
        let spectrum = classical_solver(&h).unwrap();

        let expected = [-1.0, 0.0, 0.0, 1.0];
        for (e, x) in spectrum.energies.iter().zip(expected) {
            assert_abs_diff_eq!(*e, x, epsilon = 1e-10);
        }
        assert_abs_diff_eq!(spectrum.gap().unwrap(), 1.0, epsilon = 1e-10);

        // Ground state is qubit 1 up, qubit 0 down: basis index 2.
        assert_abs_diff_eq!(spectrum.states[0][2].norm(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_transverse_pair() {
        // XX + YY has eigenvalues {-2, 0, 0, 2}.
        let h = PauliHamiltonian::from_labels(&[("XX", 1.0), ("YY", 1.0)]).unwrap();
        let spectrum = classical_solver(&h).unwrap();
        assert_abs_diff_eq!(spectrum.ground_energy().unwrap(), -2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(spectrum.energies[3], 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_eigenvectors_satisfy_eigen_equation() {
        let h = PauliHamiltonian::from_labels(&[("XZ", 0.3), ("YI", -0.7), ("ZZ", 0.2)]).unwrap();
        let spectrum = classical_solver(&h).unwrap();
        for (e, v) in spectrum.energies.iter().zip(&spectrum.states) {
            assert_abs_diff_eq!(h.expectation(v), *e, epsilon = 1e-9);
        }
        assert!(spectrum.energies.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_rejects_non_finite() {
        let h = PauliHamiltonian::from_labels(&[("Z", f64::NAN)]).unwrap();
        assert!(matches!(classical_solver(&h), Err(AlgoError::InvalidInput(_))));
    }
}
