//! Pauli-string Hamiltonians.
//!
//! A Hamiltonian is a weighted sum of Pauli strings,
//! H = Σᵢ cᵢ Pᵢ,
//! over an explicit number of qubits. Only the non-identity factors of each
//! string are stored, keyed by qubit index.
//!
//! Labels follow the usual little-endian convention: the rightmost character
//! acts on qubit 0, so `"ZI"` is Z on qubit 1.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::qubit::QubitId;

/// A single Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pauli {
    /// Identity operator.
    I,
    /// Pauli-X operator.
    X,
    /// Pauli-Y operator.
    Y,
    /// Pauli-Z operator.
    Z,
}

impl Pauli {
    /// Get the name of this Pauli operator.
    pub fn name(&self) -> &'static str {
        match self {
            Pauli::I => "I",
            Pauli::X => "X",
            Pauli::Y => "Y",
            Pauli::Z => "Z",
        }
    }

    /// Parse a single label character.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'I' => Some(Pauli::I),
            'X' => Some(Pauli::X),
            'Y' => Some(Pauli::Y),
            'Z' => Some(Pauli::Z),
            _ => None,
        }
    }
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One weighted Pauli string, cᵢ · (P₀ ⊗ P₁ ⊗ … ⊗ Pₙ).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliTerm {
    /// The coefficient of this term.
    pub coefficient: f64,
    /// Non-identity factors as `(qubit, pauli)`, sorted by qubit.
    /// Empty means identity on all qubits.
    pub operators: Vec<(usize, Pauli)>,
}

impl PauliTerm {
    /// Create a term, dropping identity factors and sorting by qubit.
    pub fn new(coefficient: f64, operators: Vec<(usize, Pauli)>) -> Self {
        let mut operators: Vec<_> = operators
            .into_iter()
            .filter(|(_, p)| *p != Pauli::I)
            .collect();
        operators.sort_by_key(|(q, _)| *q);
        Self {
            coefficient,
            operators,
        }
    }

    /// Create an identity term (scalar).
    pub fn identity(coefficient: f64) -> Self {
        Self::new(coefficient, vec![])
    }

    /// Create a single-qubit Z term.
    pub fn z(coefficient: f64, qubit: usize) -> Self {
        Self::new(coefficient, vec![(qubit, Pauli::Z)])
    }

    /// Create a single-qubit X term.
    pub fn x(coefficient: f64, qubit: usize) -> Self {
        Self::new(coefficient, vec![(qubit, Pauli::X)])
    }

    /// Create a ZZ term.
    pub fn zz(coefficient: f64, qubit1: usize, qubit2: usize) -> Self {
        Self::new(coefficient, vec![(qubit1, Pauli::Z), (qubit2, Pauli::Z)])
    }

    /// Parse a label such as `"XIZ"` (rightmost character on qubit 0).
    pub fn from_label(label: &str, coefficient: f64) -> IrResult<Self> {
        let width = label.chars().count();
        if width == 0 {
            return Err(IrError::InvalidPauliLabel {
                label: label.to_string(),
                reason: "empty label".into(),
            });
        }
        let mut operators = Vec::with_capacity(width);
        for (pos, c) in label.chars().enumerate() {
            let pauli = Pauli::from_char(c).ok_or_else(|| IrError::InvalidPauliLabel {
                label: label.to_string(),
                reason: format!("unexpected character '{c}'"),
            })?;
            operators.push((width - 1 - pos, pauli));
        }
        Ok(Self::new(coefficient, operators))
    }

    /// Check if this is an identity term.
    pub fn is_identity(&self) -> bool {
        self.operators.is_empty()
    }

    /// Get the qubits this term acts on.
    pub fn qubits(&self) -> impl Iterator<Item = usize> + '_ {
        self.operators.iter().map(|(q, _)| *q)
    }

    /// Get the maximum qubit index.
    pub fn max_qubit(&self) -> Option<usize> {
        self.operators.last().map(|(q, _)| *q)
    }

    /// The factor acting on `qubit`.
    pub fn pauli_on(&self, qubit: usize) -> Pauli {
        self.operators
            .iter()
            .find(|(q, _)| *q == qubit)
            .map_or(Pauli::I, |(_, p)| *p)
    }

    /// True if every shared qubit carries the same factor in both terms.
    pub fn qubit_wise_commutes(&self, other: &PauliTerm) -> bool {
        self.operators
            .iter()
            .all(|(q, p)| matches!(other.pauli_on(*q), Pauli::I) || other.pauli_on(*q) == *p)
    }

    /// Label over `num_qubits` characters, highest qubit first.
    pub fn label(&self, num_qubits: usize) -> String {
        (0..num_qubits)
            .rev()
            .map(|q| self.pauli_on(q).name())
            .collect()
    }

    /// Image of basis state `col` under the string: `(row, phase)`.
    fn apply_to_basis(&self, col: usize) -> (usize, Complex64) {
        let mut row = col;
        let mut phase = Complex64::new(1.0, 0.0);
        for &(q, pauli) in &self.operators {
            let bit = (col >> q) & 1;
            match pauli {
                Pauli::I => {}
                Pauli::X => row ^= 1 << q,
                Pauli::Y => {
                    row ^= 1 << q;
                    // Y|0⟩ = i|1⟩, Y|1⟩ = -i|0⟩
                    phase *= if bit == 0 {
                        Complex64::new(0.0, 1.0)
                    } else {
                        Complex64::new(0.0, -1.0)
                    };
                }
                Pauli::Z => {
                    if bit == 1 {
                        phase = -phase;
                    }
                }
            }
        }
        (row, phase)
    }
}

impl fmt::Display for PauliTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coefficient >= 0.0 {
            write!(f, "+{:.4} ", self.coefficient)?;
        } else {
            write!(f, "{:.4} ", self.coefficient)?;
        }

        if self.operators.is_empty() {
            write!(f, "I")?;
        } else {
            for (i, (qubit, pauli)) in self.operators.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{pauli}[{qubit}]")?;
            }
        }
        Ok(())
    }
}

/// A Hamiltonian represented as a sum of Pauli terms on a fixed register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliHamiltonian {
    num_qubits: usize,
    terms: Vec<PauliTerm>,
}

impl PauliHamiltonian {
    /// Create a Hamiltonian over `num_qubits` qubits.
    pub fn new(num_qubits: usize, terms: Vec<PauliTerm>) -> IrResult<Self> {
        let mut h = Self {
            num_qubits,
            terms: Vec::with_capacity(terms.len()),
        };
        for term in terms {
            h.add_term(term)?;
        }
        Ok(h)
    }

    /// Build from `(label, coefficient)` pairs of equal width.
    pub fn from_labels(labels: &[(&str, f64)]) -> IrResult<Self> {
        let Some((first, _)) = labels.first() else {
            return Err(IrError::InvalidPauliLabel {
                label: String::new(),
                reason: "no terms given".into(),
            });
        };
        let width = first.chars().count();
        let mut terms = Vec::with_capacity(labels.len());
        for (label, coefficient) in labels {
            if label.chars().count() != width {
                return Err(IrError::InvalidPauliLabel {
                    label: (*label).to_string(),
                    reason: format!("expected {width} characters"),
                });
            }
            terms.push(PauliTerm::from_label(label, *coefficient)?);
        }
        Self::new(width, terms)
    }

    /// Add a term, checking it fits the register.
    pub fn add_term(&mut self, term: PauliTerm) -> IrResult<()> {
        if let Some(q) = term.max_qubit().filter(|q| *q >= self.num_qubits) {
            return Err(IrError::QubitNotFound {
                qubit: QubitId(u32::try_from(q).unwrap_or(u32::MAX)),
                gate_name: Some("pauli term".into()),
            });
        }
        self.terms.push(term);
        Ok(())
    }

    /// Number of qubits the operator acts on.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The terms, in insertion order.
    pub fn terms(&self) -> &[PauliTerm] {
        &self.terms
    }

    /// Get the number of terms.
    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Sum of identity coefficients.
    pub fn identity_coefficient(&self) -> f64 {
        self.terms
            .iter()
            .filter(|t| t.is_identity())
            .map(|t| t.coefficient)
            .sum()
    }

    /// Iterate over non-identity terms.
    pub fn non_identity_terms(&self) -> impl Iterator<Item = &PauliTerm> {
        self.terms.iter().filter(|t| !t.is_identity())
    }

    /// Dense row-major matrix of dimension 2ⁿ × 2ⁿ.
    ///
    /// Bit `q` of a basis index is the state of qubit `q`.
    pub fn to_matrix(&self) -> Vec<Complex64> {
        let dim = 1usize << self.num_qubits;
        let mut matrix = vec![Complex64::new(0.0, 0.0); dim * dim];
        for term in &self.terms {
            for col in 0..dim {
                let (row, phase) = term.apply_to_basis(col);
                matrix[row * dim + col] += phase * term.coefficient;
            }
        }
        matrix
    }

    /// ⟨ψ|H|ψ⟩ for a little-endian state vector of matching dimension.
    pub fn expectation(&self, amplitudes: &[Complex64]) -> f64 {
        let mut total = 0.0;
        for term in &self.terms {
            let mut acc = Complex64::new(0.0, 0.0);
            for (col, amp) in amplitudes.iter().enumerate() {
                let (row, phase) = term.apply_to_basis(col);
                if let Some(bra) = amplitudes.get(row) {
                    acc += bra.conj() * phase * amp;
                }
            }
            total += term.coefficient * acc.re;
        }
        total
    }
}

impl fmt::Display for PauliHamiltonian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Hamiltonian ({} terms, {} qubits):",
            self.num_terms(),
            self.num_qubits()
        )?;
        for term in &self.terms {
            writeln!(f, "  {term}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_pauli_term_creation() {
        let term = PauliTerm::zz(-0.5, 0, 1);
        assert_eq!(term.coefficient, -0.5);
        assert_eq!(term.operators.len(), 2);
        assert!(!term.is_identity());
    }

    #[test]
    fn test_identity_term() {
        let term = PauliTerm::identity(1.0);
        assert!(term.is_identity());
        assert_eq!(term.max_qubit(), None);
    }

    #[test]
    fn test_label_ordering() {
        let term = PauliTerm::from_label("ZI", 0.5).unwrap();
        assert_eq!(term.operators, vec![(1, Pauli::Z)]);
        assert_eq!(term.label(2), "ZI");
        assert_eq!(PauliTerm::from_label("xy", 1.0).unwrap().label(2), "XY");
        assert!(PauliTerm::from_label("ZQ", 1.0).is_err());
    }

    #[test]
    fn test_from_labels_rejects_ragged_widths() {
        assert!(PauliHamiltonian::from_labels(&[("ZI", 1.0), ("Z", 1.0)]).is_err());
        assert!(PauliHamiltonian::from_labels(&[]).is_err());
    }

    #[test]
    fn test_term_out_of_register() {
        assert!(PauliHamiltonian::new(2, vec![PauliTerm::z(1.0, 2)]).is_err());
    }

    #[test]
    fn test_qubit_wise_commutation() {
        let zi = PauliTerm::from_label("ZI", 1.0).unwrap();
        let zz = PauliTerm::from_label("ZZ", 1.0).unwrap();
        let xz = PauliTerm::from_label("XZ", 1.0).unwrap();
        assert!(zi.qubit_wise_commutes(&zz));
        assert!(!zi.qubit_wise_commutes(&xz));
        assert!(zz.qubit_wise_commutes(&PauliTerm::identity(2.0)));
    }

    #[test]
    fn test_diagonal_matrix() {
        // H = 0.5 ZI + 0.5 ZZ is diagonal: basis |q1 q0⟩ energies.
        let h = PauliHamiltonian::from_labels(&[("ZI", 0.5), ("ZZ", 0.5)]).unwrap();
        let m = h.to_matrix();
        let diag: Vec<f64> = (0..4).map(|i| m[i * 4 + i].re).collect();
        assert_eq!(diag, vec![1.0, 0.0, -1.0, 0.0]);
    }

    #[test]
    fn test_y_matrix() {
        let h = PauliHamiltonian::from_labels(&[("Y", 1.0)]).unwrap();
        let m = h.to_matrix();
        assert_eq!(m[1 * 2], Complex64::new(0.0, 1.0));
        assert_eq!(m[1], Complex64::new(0.0, -1.0));
    }

    #[test]
    fn test_expectation_on_basis_state() {
        let h = PauliHamiltonian::from_labels(&[("ZI", 0.5), ("ZZ", 0.5), ("XX", 2.0)]).unwrap();
        let mut psi = vec![Complex64::new(0.0, 0.0); 4];
        psi[2] = Complex64::new(1.0, 0.0);
        assert_abs_diff_eq!(h.expectation(&psi), -1.0, epsilon = 1e-12);
    }

    fn arb_label() -> impl Strategy<Value = String> {
        prop::collection::vec(prop::sample::select(vec!['I', 'X', 'Y', 'Z']), 3)
            .prop_map(|cs| cs.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_matrix_is_hermitian(
            labels in prop::collection::vec(arb_label(), 1..5),
            coeffs in prop::collection::vec(-2.0f64..2.0, 5),
        ) {
            let pairs: Vec<(&str, f64)> = labels.iter().map(String::as_str).zip(coeffs).collect();
            let h = PauliHamiltonian::from_labels(&pairs).unwrap();
            let m = h.to_matrix();
            for r in 0..8 {
                for c in 0..8 {
                    let diff = m[r * 8 + c] - m[c * 8 + r].conj();
                    prop_assert!(diff.norm() < 1e-12);
                }
            }
        }
    }
}
