//! High-level circuit builder API.

use std::collections::{BTreeMap, BTreeSet};

use crate::dag::CircuitDag;
use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::Instruction;
use crate::parameter::ParameterExpression;
use crate::qubit::{ClbitId, QubitId};

/// A quantum circuit.
///
/// Wraps a [`CircuitDag`] with a fluent builder for common gates plus the
/// whole-circuit operations the variational engines rely on: composition at a
/// qubit offset, inversion and parameter binding. All of those return new
/// circuits and leave `self` untouched.
#[derive(Debug, Clone)]
pub struct Circuit {
    name: String,
    num_qubits: u32,
    num_clbits: u32,
    dag: CircuitDag,
}

impl Circuit {
    /// Create a circuit with a given number of qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut dag = CircuitDag::new();
        for q in 0..num_qubits {
            dag.add_qubit(QubitId(q));
        }
        for c in 0..num_clbits {
            dag.add_clbit(ClbitId(c));
        }
        Self {
            name: name.into(),
            num_qubits,
            num_clbits,
            dag,
        }
    }

    /// Append `count` classical bits, returning the first new id.
    pub fn add_clbits(&mut self, count: u32) -> ClbitId {
        let first = ClbitId(self.num_clbits);
        for c in self.num_clbits..self.num_clbits + count {
            self.dag.add_clbit(ClbitId(c));
        }
        self.num_clbits += count;
        first
    }

    /// Apply an arbitrary instruction.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        self.dag.apply(instruction)?;
        Ok(self)
    }

    fn one(&mut self, gate: StandardGate, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(gate, qubit))
    }

    fn two(&mut self, gate: StandardGate, a: QubitId, b: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(gate, a, b))
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::H, qubit)
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::X, qubit)
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::Y, qubit)
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::Z, qubit)
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::S, qubit)
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::Sdg, qubit)
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::T, qubit)
    }

    /// Apply T-dagger gate.
    pub fn tdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::Tdg, qubit)
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.one(StandardGate::SX, qubit)
    }

    /// Apply Rx rotation gate.
    pub fn rx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.one(StandardGate::Rx(theta.into()), qubit)
    }

    /// Apply Ry rotation gate.
    pub fn ry(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.one(StandardGate::Ry(theta.into()), qubit)
    }

    /// Apply Rz rotation gate.
    pub fn rz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.one(StandardGate::Rz(theta.into()), qubit)
    }

    /// Apply phase gate.
    pub fn p(
        &mut self,
        lambda: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.one(StandardGate::P(lambda.into()), qubit)
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::CX, control, target)
    }

    /// Apply controlled-Y gate.
    pub fn cy(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::CY, control, target)
    }

    /// Apply controlled-Z gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::CZ, control, target)
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::Swap, q1, q2)
    }

    /// Apply controlled-Rz gate.
    pub fn crz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.two(StandardGate::CRz(theta.into()), control, target)
    }

    /// Apply controlled-phase gate.
    pub fn cp(
        &mut self,
        lambda: impl Into<ParameterExpression>,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.two(StandardGate::CP(lambda.into()), control, target)
    }

    /// Apply Toffoli gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(StandardGate::CCX, [c1, c2, target]))
    }

    /// Apply Fredkin gate.
    pub fn cswap(&mut self, control: QubitId, t1: QubitId, t2: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(StandardGate::CSwap, [control, t1, t2]))
    }

    // =========================================================================
    // Non-unitary operations
    // =========================================================================

    /// Measure a qubit to a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.apply(Instruction::measure(qubit, clbit))
    }

    /// Measure every qubit `q` into classical bit `q`, adding bits as needed.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        if self.num_clbits < self.num_qubits {
            self.add_clbits(self.num_qubits - self.num_clbits);
        }
        for q in 0..self.num_qubits {
            self.measure(QubitId(q), ClbitId(q))?;
        }
        Ok(self)
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::reset(qubit))
    }

    // =========================================================================
    // Whole-circuit operations
    // =========================================================================

    /// Append `other` onto qubits `qubit_offset..qubit_offset + other.num_qubits()`.
    ///
    /// Classical bits of `other` are added after the existing ones.
    pub fn append(&mut self, other: &Circuit, qubit_offset: u32) -> IrResult<&mut Self> {
        if qubit_offset + other.num_qubits > self.num_qubits {
            return Err(IrError::CompositionOutOfRange {
                width: other.num_qubits,
                offset: qubit_offset,
                target: self.num_qubits,
            });
        }
        let clbit_offset = self.num_clbits;
        if other.num_clbits > 0 {
            self.add_clbits(other.num_clbits);
        }
        for inst in other.instructions()? {
            self.dag.apply(inst.shifted(qubit_offset, clbit_offset))?;
        }
        Ok(self)
    }

    /// The adjoint circuit, named `<name>_dg`.
    ///
    /// Fails with [`IrError::NonUnitary`] if the circuit measures or resets.
    pub fn inverse(&self) -> IrResult<Circuit> {
        let mut inverted =
            Circuit::with_size(format!("{}_dg", self.name), self.num_qubits, self.num_clbits);
        for inst in self.instructions()?.into_iter().rev() {
            inverted.dag.apply(inst.inverse()?)?;
        }
        Ok(inverted)
    }

    /// Free parameter names in lexicographic order.
    pub fn parameters(&self) -> IrResult<Vec<String>> {
        let mut names = BTreeSet::new();
        for inst in self.instructions()? {
            if let Some(p) = inst.as_gate().and_then(StandardGate::parameter) {
                p.collect_symbols(&mut names);
            }
        }
        Ok(names.into_iter().collect())
    }

    /// Check whether any gate still has a free parameter.
    pub fn is_parameterized(&self) -> IrResult<bool> {
        Ok(self.instructions()?.iter().any(|i| i.is_parameterized()))
    }

    /// Substitute named values, returning a new circuit.
    pub fn assign(&self, values: &BTreeMap<String, f64>) -> IrResult<Circuit> {
        let mut bound = Circuit::with_size(self.name.clone(), self.num_qubits, self.num_clbits);
        for inst in self.instructions()? {
            bound.dag.apply(inst.bind(values))?;
        }
        Ok(bound)
    }

    /// Bind `values` positionally against [`Circuit::parameters`].
    pub fn bind_parameters(&self, values: &[f64]) -> IrResult<Circuit> {
        let names = self.parameters()?;
        if names.len() != values.len() {
            return Err(IrError::ParameterCountMismatch {
                expected: names.len(),
                got: values.len(),
            });
        }
        let map: BTreeMap<String, f64> = names.into_iter().zip(values.iter().copied()).collect();
        self.assign(&map)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the circuit.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits as usize
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.num_clbits as usize
    }

    /// Get the number of operations.
    pub fn num_ops(&self) -> usize {
        self.dag.num_ops()
    }

    /// Get the circuit depth.
    pub fn depth(&self) -> IrResult<usize> {
        self.dag.depth()
    }

    /// Instructions in execution order.
    pub fn instructions(&self) -> IrResult<Vec<&Instruction>> {
        self.dag.topological_ops()
    }

    /// Get the underlying DAG.
    pub fn dag(&self) -> &CircuitDag {
        &self.dag
    }

    /// Create a Bell state circuit.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Circuit::with_size("bell", 2, 2);
        circuit
            .h(QubitId(0))?
            .cx(QubitId(0), QubitId(1))?
            .measure_all()?;
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bell_state() {
        let circuit = Circuit::bell().unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_clbits(), 2);
        assert_eq!(circuit.depth().unwrap(), 3);
    }

    #[test]
    fn test_fluent_api() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit
            .h(QubitId(0))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .cx(QubitId(1), QubitId(2))
            .unwrap();
        assert_eq!(circuit.num_ops(), 3);
    }

    #[test]
    fn test_append_at_offset() {
        let mut prep = Circuit::with_size("prep", 1, 0);
        prep.x(QubitId(0)).unwrap();

        let mut host = Circuit::with_size("host", 3, 0);
        host.append(&prep, 2).unwrap();
        let ops = host.instructions().unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].qubits, vec![QubitId(2)]);

        assert!(matches!(
            host.append(&prep, 3),
            Err(IrError::CompositionOutOfRange { .. })
        ));
    }

    #[test]
    fn test_inverse_reverses_order() {
        let mut c = Circuit::with_size("u", 1, 0);
        c.h(QubitId(0)).unwrap().s(QubitId(0)).unwrap();
        let inv = c.inverse().unwrap();
        assert_eq!(inv.name(), "u_dg");
        let gates: Vec<_> = inv
            .instructions()
            .unwrap()
            .iter()
            .filter_map(|i| i.as_gate().cloned())
            .collect();
        assert_eq!(gates, vec![StandardGate::Sdg, StandardGate::H]);
    }

    #[test]
    fn test_inverse_rejects_measurement() {
        let bell = Circuit::bell().unwrap();
        assert!(matches!(bell.inverse(), Err(IrError::NonUnitary(_))));
    }

    #[test]
    fn test_bind_parameters_length_mismatch() {
        let mut c = Circuit::with_size("v", 1, 0);
        c.ry(ParameterExpression::symbol("a"), QubitId(0)).unwrap();
        assert!(matches!(
            c.bind_parameters(&[0.1, 0.2]),
            Err(IrError::ParameterCountMismatch { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn test_bind_does_not_mutate_template() {
        let mut c = Circuit::with_size("v", 1, 0);
        c.rz(ParameterExpression::symbol("a"), QubitId(0)).unwrap();
        let bound = c.bind_parameters(&[0.5]).unwrap();
        assert!(!bound.is_parameterized().unwrap());
        assert!(c.is_parameterized().unwrap());
        assert_eq!(c.parameters().unwrap(), vec!["a".to_string()]);
    }

    proptest! {
        #[test]
        fn prop_binding_follows_sorted_names(values in prop::collection::vec(-3.0f64..3.0, 1..6)) {
            // Insert gates in reverse name order; binding must still follow sorted names.
            let n = values.len();
            let mut c = Circuit::with_size("p", 1, 0);
            for i in (0..n).rev() {
                c.rx(ParameterExpression::symbol(format!("p{i}")), QubitId(0)).unwrap();
            }
            let bound = c.bind_parameters(&values).unwrap();
            let angles: Vec<f64> = bound
                .instructions()
                .unwrap()
                .iter()
                .filter_map(|i| i.as_gate().and_then(StandardGate::parameter).and_then(ParameterExpression::as_f64))
                .collect();
            let expected: Vec<f64> = values.iter().rev().copied().collect();
            prop_assert_eq!(angles, expected);

            let again = c.bind_parameters(&values).unwrap();
            prop_assert_eq!(
                format!("{:?}", again.instructions().unwrap()),
                format!("{:?}", bound.instructions().unwrap())
            );
        }
    }
}
