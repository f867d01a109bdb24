//! Circuit instructions combining gates with operands.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::qubit::{ClbitId, QubitId};

/// The kind of instruction in a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// A quantum gate operation.
    Gate(StandardGate),
    /// Measurement; `qubits[i]` is recorded into `clbits[i]`.
    Measure,
    /// Reset qubit to |0⟩.
    Reset,
}

impl InstructionKind {
    /// Name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            InstructionKind::Gate(gate) => gate.name(),
            InstructionKind::Measure => "measure",
            InstructionKind::Reset => "reset",
        }
    }
}

/// A complete instruction with operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The kind of instruction.
    pub kind: InstructionKind,
    /// Qubits this instruction operates on.
    pub qubits: Vec<QubitId>,
    /// Classical bits this instruction writes (measure only).
    pub clbits: Vec<ClbitId>,
}

impl Instruction {
    /// Create a gate instruction.
    pub fn gate(gate: StandardGate, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Gate(gate),
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
        }
    }

    /// Create a single-qubit gate instruction.
    pub fn single_qubit_gate(gate: StandardGate, qubit: QubitId) -> Self {
        Self::gate(gate, [qubit])
    }

    /// Create a two-qubit gate instruction.
    pub fn two_qubit_gate(gate: StandardGate, q1: QubitId, q2: QubitId) -> Self {
        Self::gate(gate, [q1, q2])
    }

    /// Create a measurement instruction.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure,
            qubits: vec![qubit],
            clbits: vec![clbit],
        }
    }

    /// Create a reset instruction.
    pub fn reset(qubit: QubitId) -> Self {
        Self {
            kind: InstructionKind::Reset,
            qubits: vec![qubit],
            clbits: vec![],
        }
    }

    /// Check if this is a measurement.
    #[inline]
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure)
    }

    /// Get the gate if this is a gate instruction.
    pub fn as_gate(&self) -> Option<&StandardGate> {
        match &self.kind {
            InstructionKind::Gate(gate) => Some(gate),
            _ => None,
        }
    }

    /// Check if a gate still carries a free parameter.
    pub fn is_parameterized(&self) -> bool {
        self.as_gate().is_some_and(StandardGate::is_parameterized)
    }

    /// The adjoint instruction.
    pub fn inverse(&self) -> IrResult<Self> {
        let kind = match &self.kind {
            InstructionKind::Gate(gate) => InstructionKind::Gate(gate.inverse()),
            other => return Err(IrError::NonUnitary(other.name().to_string())),
        };
        Ok(Self {
            kind,
            qubits: self.qubits.clone(),
            clbits: self.clbits.clone(),
        })
    }

    /// Copy of this instruction moved onto shifted qubit and clbit wires.
    #[must_use]
    pub fn shifted(&self, qubit_offset: u32, clbit_offset: u32) -> Self {
        Self {
            kind: self.kind.clone(),
            qubits: self.qubits.iter().map(|q| q.offset(qubit_offset)).collect(),
            clbits: self
                .clbits
                .iter()
                .map(|c| ClbitId(c.0 + clbit_offset))
                .collect(),
        }
    }

    /// Copy of this instruction with parameter values substituted.
    #[must_use]
    pub fn bind(&self, values: &BTreeMap<String, f64>) -> Self {
        let kind = match &self.kind {
            InstructionKind::Gate(gate) => InstructionKind::Gate(gate.bind(values)),
            other => other.clone(),
        };
        Self {
            kind,
            qubits: self.qubits.clone(),
            clbits: self.clbits.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterExpression;

    #[test]
    fn test_measure_is_not_invertible() {
        let m = Instruction::measure(QubitId(0), ClbitId(0));
        assert!(matches!(m.inverse(), Err(IrError::NonUnitary(_))));
    }

    #[test]
    fn test_reset_is_not_invertible() {
        let r = Instruction::reset(QubitId(1));
        assert_eq!(r.kind.name(), "reset");
        assert!(matches!(r.inverse(), Err(IrError::NonUnitary(name)) if name == "reset"));
        let h = Instruction::single_qubit_gate(StandardGate::H, QubitId(1));
        assert_eq!(h.inverse().unwrap(), h);
    }

    #[test]
    fn test_shifted() {
        let inst = Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(1));
        let moved = inst.shifted(3, 0);
        assert_eq!(moved.qubits, vec![QubitId(3), QubitId(4)]);
        assert_eq!(moved.kind, inst.kind);
    }

    #[test]
    fn test_bind_gate() {
        let inst =
            Instruction::single_qubit_gate(StandardGate::Ry(ParameterExpression::symbol("a")), QubitId(0));
        assert!(inst.is_parameterized());
        let bound = inst.bind(&BTreeMap::from([("a".to_string(), 0.5)]));
        assert!(!bound.is_parameterized());
    }
}
