//! Statevector simulation engine.
//!
//! Amplitude index bit `q` holds the state of qubit `q`. Every gate is
//! reduced to one of three kernels: a 2×2 unitary on a target qubit, the
//! same under a control mask, or a (controlled) swap of two wires.

use num_complex::Complex64;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

use qexcite_ir::{Circuit, Instruction, InstructionKind, IrError, IrResult, ParameterExpression, StandardGate};

type Matrix2 = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

fn real(v: f64) -> Complex64 {
    Complex64::new(v, 0.0)
}

fn phase_matrix(theta: f64) -> Matrix2 {
    [[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, theta)]]
}

fn rx_matrix(theta: f64) -> Matrix2 {
    let (s, c) = (theta / 2.0).sin_cos();
    let mis = Complex64::new(0.0, -s);
    [[real(c), mis], [mis, real(c)]]
}

fn ry_matrix(theta: f64) -> Matrix2 {
    let (s, c) = (theta / 2.0).sin_cos();
    [[real(c), real(-s)], [real(s), real(c)]]
}

fn rz_matrix(theta: f64) -> Matrix2 {
    [
        [Complex64::from_polar(1.0, -theta / 2.0), ZERO],
        [ZERO, Complex64::from_polar(1.0, theta / 2.0)],
    ]
}

fn angle(gate: &StandardGate, p: &ParameterExpression) -> IrResult<f64> {
    p.as_f64()
        .ok_or_else(|| IrError::UnboundParameter(format!("{} in gate {}", p, gate.name())))
}

/// 2×2 matrix of a single-qubit gate, or of the target action of a controlled gate.
fn target_matrix(gate: &StandardGate) -> IrResult<Option<Matrix2>> {
    let m = match gate {
        StandardGate::I => [[ONE, ZERO], [ZERO, ONE]],
        StandardGate::X | StandardGate::CX | StandardGate::CCX => [[ZERO, ONE], [ONE, ZERO]],
        StandardGate::Y | StandardGate::CY => [[ZERO, -I], [I, ZERO]],
        StandardGate::Z | StandardGate::CZ => [[ONE, ZERO], [ZERO, -ONE]],
        StandardGate::H => [
            [real(FRAC_1_SQRT_2), real(FRAC_1_SQRT_2)],
            [real(FRAC_1_SQRT_2), real(-FRAC_1_SQRT_2)],
        ],
        StandardGate::S => phase_matrix(PI / 2.0),
        StandardGate::Sdg => phase_matrix(-PI / 2.0),
        StandardGate::T => phase_matrix(PI / 4.0),
        StandardGate::Tdg => phase_matrix(-PI / 4.0),
        StandardGate::SX => rx_matrix(PI / 2.0),
        StandardGate::SXdg => rx_matrix(-PI / 2.0),
        StandardGate::Rx(p) => rx_matrix(angle(gate, p)?),
        StandardGate::Ry(p) => ry_matrix(angle(gate, p)?),
        StandardGate::Rz(p) | StandardGate::CRz(p) => rz_matrix(angle(gate, p)?),
        StandardGate::P(p) | StandardGate::CP(p) => phase_matrix(angle(gate, p)?),
        StandardGate::Swap | StandardGate::CSwap => return Ok(None),
    };
    Ok(Some(m))
}

/// A pure quantum state over `num_qubits` qubits.
#[derive(Debug, Clone)]
pub struct Statevector {
    amplitudes: Vec<Complex64>,
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let mut amplitudes = vec![ZERO; 1 << num_qubits];
        amplitudes[0] = ONE;
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Simulate the unitary part of `circuit` from |0...0⟩.
    ///
    /// Measurements must be terminal: a gate on an already measured qubit,
    /// or a reset, is rejected.
    pub fn from_circuit(circuit: &Circuit) -> IrResult<Self> {
        let mut sv = Self::new(circuit.num_qubits());
        let mut measured = vec![false; circuit.num_qubits()];
        for inst in circuit.instructions()? {
            match &inst.kind {
                InstructionKind::Measure => {
                    for q in &inst.qubits {
                        measured[q.index()] = true;
                    }
                }
                InstructionKind::Reset => {
                    return Err(IrError::NonUnitary("reset".into()));
                }
                InstructionKind::Gate(gate) => {
                    if let Some(q) = inst.qubits.iter().find(|q| measured[q.index()]) {
                        return Err(IrError::InvalidDag(format!(
                            "gate {} acts on {q} after it was measured",
                            gate.name()
                        )));
                    }
                    sv.apply(inst)?;
                }
            }
        }
        Ok(sv)
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The amplitudes, little-endian over qubits.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Born-rule probabilities of each basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(Complex64::norm_sqr).collect()
    }

    /// Apply a gate instruction; non-gate instructions are ignored.
    pub fn apply(&mut self, instruction: &Instruction) -> IrResult<()> {
        let InstructionKind::Gate(gate) = &instruction.kind else {
            return Ok(());
        };
        let qubits: Vec<usize> = instruction.qubits.iter().map(|q| q.index()).collect();
        let (controls, operands) = qubits.split_at(qubits.len() - match gate {
            StandardGate::Swap | StandardGate::CSwap => 2,
            _ => 1,
        });
        let control_mask = controls.iter().fold(0usize, |m, q| m | (1 << q));

        match target_matrix(gate)? {
            Some(m) => self.apply_controlled(control_mask, operands[0], &m),
            None => self.apply_controlled_swap(control_mask, operands[0], operands[1]),
        }
        Ok(())
    }

    fn apply_controlled(&mut self, control_mask: usize, target: usize, m: &Matrix2) {
        let tgt = 1 << target;
        for i in 0..self.amplitudes.len() {
            if i & tgt == 0 && i & control_mask == control_mask {
                let j = i | tgt;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = m[0][0] * a + m[0][1] * b;
                self.amplitudes[j] = m[1][0] * a + m[1][1] * b;
            }
        }
    }

    fn apply_controlled_swap(&mut self, control_mask: usize, q1: usize, q2: usize) {
        let (m1, m2) = (1 << q1, 1 << q2);
        for i in 0..self.amplitudes.len() {
            if i & control_mask == control_mask && i & m1 != 0 && i & m2 == 0 {
                self.amplitudes.swap(i, (i & !m1) | m2);
            }
        }
    }
}
