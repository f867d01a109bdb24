//! Quantum gate types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::parameter::ParameterExpression;

/// Standard gates with known semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(ParameterExpression),
    /// Rotation around Y axis.
    Ry(ParameterExpression),
    /// Rotation around Z axis.
    Rz(ParameterExpression),
    /// Phase gate.
    P(ParameterExpression),

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// SWAP gate.
    Swap,
    /// Controlled rotation around Z.
    CRz(ParameterExpression),
    /// Controlled phase gate.
    CP(ParameterExpression),

    // Three-qubit gates
    /// Toffoli gate (CCX).
    CCX,
    /// Fredkin gate (CSWAP), control first.
    CSwap,
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::SXdg => "sxdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::Swap => "swap",
            StandardGate::CRz(_) => "crz",
            StandardGate::CP(_) => "cp",
            StandardGate::CCX => "ccx",
            StandardGate::CSwap => "cswap",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::I
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::SX
            | StandardGate::SXdg
            | StandardGate::Rx(_)
            | StandardGate::Ry(_)
            | StandardGate::Rz(_)
            | StandardGate::P(_) => 1,

            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::Swap
            | StandardGate::CRz(_)
            | StandardGate::CP(_) => 2,

            StandardGate::CCX | StandardGate::CSwap => 3,
        }
    }

    /// The gate's angle, if it has one.
    pub fn parameter(&self) -> Option<&ParameterExpression> {
        match self {
            StandardGate::Rx(p)
            | StandardGate::Ry(p)
            | StandardGate::Rz(p)
            | StandardGate::P(p)
            | StandardGate::CRz(p)
            | StandardGate::CP(p) => Some(p),
            _ => None,
        }
    }

    /// Check if this gate still has a free parameter.
    pub fn is_parameterized(&self) -> bool {
        self.parameter().is_some_and(ParameterExpression::is_symbolic)
    }

    /// The adjoint of this gate.
    #[must_use]
    pub fn inverse(&self) -> Self {
        match self {
            StandardGate::S => StandardGate::Sdg,
            StandardGate::Sdg => StandardGate::S,
            StandardGate::T => StandardGate::Tdg,
            StandardGate::Tdg => StandardGate::T,
            StandardGate::SX => StandardGate::SXdg,
            StandardGate::SXdg => StandardGate::SX,
            StandardGate::Rx(p) => StandardGate::Rx(-p.clone()),
            StandardGate::Ry(p) => StandardGate::Ry(-p.clone()),
            StandardGate::Rz(p) => StandardGate::Rz(-p.clone()),
            StandardGate::P(p) => StandardGate::P(-p.clone()),
            StandardGate::CRz(p) => StandardGate::CRz(-p.clone()),
            StandardGate::CP(p) => StandardGate::CP(-p.clone()),
            // Hermitian gates are their own inverse.
            other => other.clone(),
        }
    }

    /// Substitute parameter values into the gate's angle.
    #[must_use]
    pub fn bind(&self, values: &BTreeMap<String, f64>) -> Self {
        match self {
            StandardGate::Rx(p) => StandardGate::Rx(p.bind_all(values)),
            StandardGate::Ry(p) => StandardGate::Ry(p.bind_all(values)),
            StandardGate::Rz(p) => StandardGate::Rz(p.bind_all(values)),
            StandardGate::P(p) => StandardGate::P(p.bind_all(values)),
            StandardGate::CRz(p) => StandardGate::CRz(p.bind_all(values)),
            StandardGate::CP(p) => StandardGate::CP(p.bind_all(values)),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_properties() {
        assert_eq!(StandardGate::H.name(), "h");
        assert_eq!(StandardGate::H.num_qubits(), 1);
        assert_eq!(StandardGate::CX.num_qubits(), 2);
        assert_eq!(StandardGate::CSwap.num_qubits(), 3);
    }

    #[test]
    fn test_parameterized_gate() {
        let rx = StandardGate::Rx(ParameterExpression::symbol("theta"));
        assert!(rx.is_parameterized());

        let rx_bound = StandardGate::Rx(ParameterExpression::constant(1.0));
        assert!(!rx_bound.is_parameterized());
    }

    #[test]
    fn test_inverse_pairs() {
        assert_eq!(StandardGate::S.inverse(), StandardGate::Sdg);
        assert_eq!(StandardGate::SXdg.inverse(), StandardGate::SX);
        assert_eq!(StandardGate::CSwap.inverse(), StandardGate::CSwap);

        let ry = StandardGate::Ry(ParameterExpression::constant(0.3));
        assert_eq!(ry.inverse(), StandardGate::Ry(ParameterExpression::constant(-0.3)));
    }

    #[test]
    fn test_bind_then_invert_matches_invert_then_bind() {
        let values = BTreeMap::from([("t".to_string(), 1.25)]);
        let gate = StandardGate::Rz(ParameterExpression::symbol("t"));
        assert_eq!(gate.bind(&values).inverse(), gate.inverse().bind(&values));
    }
}
