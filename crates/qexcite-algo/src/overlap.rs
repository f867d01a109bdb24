//! State overlap estimators, |⟨a|b⟩|², from measurement counts.
//!
//! Three protocols are available:
//!
//! | Method | Qubits | Reads |
//! |--------|--------|-------|
//! | [`OverlapMethod::Swap`] | 2n + 1 | ancilla only |
//! | [`OverlapMethod::DestructiveSwap`] | 2n | every qubit, paired |
//! | [`OverlapMethod::AmplitudeTransition`] | n | every qubit |
//!
//! All estimates are unbiased but noisy and may land slightly outside
//! `[0, 1]`. Outcomes absent from the counts are treated as zero.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use qexcite_hal::Counts;
use qexcite_ir::{Circuit, ClbitId, QubitId};

use crate::error::{AlgoError, AlgoResult};
use crate::executor::Executor;

/// Protocol used to estimate the overlap of two prepared states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverlapMethod {
    /// Ancilla-controlled SWAP test.
    #[default]
    #[serde(rename = "swap")]
    Swap,
    /// Bell-basis measurement of paired registers, no ancilla.
    #[serde(rename = "dswap")]
    DestructiveSwap,
    /// Prepare one state, un-prepare the other, read all zeros.
    #[serde(rename = "amplitude")]
    AmplitudeTransition,
}

impl OverlapMethod {
    /// Estimate |⟨a|b⟩|² with `shots` samples.
    pub fn estimate(self, a: &Circuit, b: &Circuit, executor: &Executor, shots: u32) -> AlgoResult<f64> {
        match self {
            OverlapMethod::Swap => measure_swap_test(a, b, executor, shots),
            OverlapMethod::DestructiveSwap => measure_dswap_test(a, b, executor, shots),
            OverlapMethod::AmplitudeTransition => {
                measure_amplitude_transition_test(a, b, executor, shots)
            }
        }
    }
}

impl fmt::Display for OverlapMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlapMethod::Swap => write!(f, "swap"),
            OverlapMethod::DestructiveSwap => write!(f, "dswap"),
            OverlapMethod::AmplitudeTransition => write!(f, "amplitude"),
        }
    }
}

impl FromStr for OverlapMethod {
    type Err = AlgoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "swap" => Ok(OverlapMethod::Swap),
            "dswap" | "destructive_swap" => Ok(OverlapMethod::DestructiveSwap),
            "amplitude" | "amplitude_transition" => Ok(OverlapMethod::AmplitudeTransition),
            other => Err(AlgoError::InvalidInput(format!(
                "unknown overlap method '{other}' (expected swap, dswap or amplitude)"
            ))),
        }
    }
}

fn register_width(a: &Circuit, b: &Circuit) -> AlgoResult<u32> {
    if a.num_qubits() != b.num_qubits() {
        return Err(AlgoError::InvalidInput(format!(
            "cannot compare a {}-qubit state with a {}-qubit state",
            a.num_qubits(),
            b.num_qubits()
        )));
    }
    Ok(a.num_qubits() as u32)
}

/// SWAP test: ancilla on qubit 0, `a` on `1..=n`, `b` on `n+1..=2n`.
///
/// Only the ancilla is measured, into classical bit 0.
pub fn swap_test_circuit(a: &Circuit, b: &Circuit) -> AlgoResult<Circuit> {
    let n = register_width(a, b)?;
    let mut circuit = Circuit::with_size("swap_test", 2 * n + 1, 1);
    circuit.append(a, 1)?.append(b, n + 1)?;

    let ancilla = QubitId(0);
    circuit.h(ancilla)?;
    for i in 0..n {
        circuit.cswap(ancilla, QubitId(1 + i), QubitId(n + 1 + i))?;
    }
    circuit.h(ancilla)?.measure(ancilla, ClbitId(0))?;
    Ok(circuit)
}

/// Destructive SWAP test: `a` on `0..n`, `b` on `n..2n`.
///
/// Pair `i` is rotated with `cx(a_i, b_i)` then `h(a_i)` and recorded in
/// classical bits `2i` (from `a_i`) and `2i + 1` (from `b_i`).
pub fn dswap_test_circuit(a: &Circuit, b: &Circuit) -> AlgoResult<Circuit> {
    let n = register_width(a, b)?;
    let mut circuit = Circuit::with_size("dswap_test", 2 * n, 2 * n);
    circuit.append(a, 0)?.append(b, n)?;

    for i in 0..n {
        circuit.cx(QubitId(i), QubitId(n + i))?.h(QubitId(i))?;
    }
    for i in 0..n {
        circuit
            .measure(QubitId(i), ClbitId(2 * i))?
            .measure(QubitId(n + i), ClbitId(2 * i + 1))?;
    }
    Ok(circuit)
}

/// `a` followed by the adjoint of `b`, measured on every qubit.
///
/// Both circuits must be unitary; a measurement in `b` is
/// [`qexcite_ir::IrError::NonUnitary`].
pub fn amplitude_transition_circuit(a: &Circuit, b: &Circuit) -> AlgoResult<Circuit> {
    let n = register_width(a, b)?;
    let mut circuit = Circuit::with_size("amplitude_transition", n, n);
    circuit.append(a, 0)?.append(&b.inverse()?, 0)?;
    for q in 0..n {
        circuit.measure(QubitId(q), ClbitId(q))?;
    }
    Ok(circuit)
}

/// `2·(P(ancilla = 0) − ½)` from SWAP-test counts.
pub fn swap_fidelity_from_counts(counts: &Counts) -> f64 {
    let total = counts.total_shots();
    if total == 0 {
        return 0.0;
    }
    let zeros: u64 = counts
        .iter()
        .filter(|(bits, _)| bits.starts_with('0'))
        .map(|(_, c)| c)
        .sum();
    2.0 * (zeros as f64 / total as f64 - 0.5)
}

/// Average per-pair SWAP expectation from destructive-SWAP counts.
///
/// Each of the `n` pairs scores −1 when it reads `11` and +1 otherwise; the
/// score is divided by `n` times the number of shots. For single-qubit states
/// this is exactly |⟨a|b⟩|². For wider registers it is the mean of the
/// per-qubit overlaps of the reduced states.
pub fn dswap_fidelity_from_counts(counts: &Counts, n: usize) -> f64 {
    let total = counts.total_shots();
    if total == 0 || n == 0 {
        return 0.0;
    }
    let mut score: i64 = 0;
    for (bitstring, count) in counts.iter() {
        let bits = bitstring.as_bytes();
        for pair in 0..n {
            let both = bits.get(2 * pair) == Some(&b'1') && bits.get(2 * pair + 1) == Some(&b'1');
            score += if both { -(count as i64) } else { count as i64 };
        }
    }
    score as f64 / (n as f64 * total as f64)
}

/// Probability that every one of the first `n` classical bits reads zero.
pub fn zero_probability_from_counts(counts: &Counts, n: usize) -> f64 {
    let total = counts.total_shots();
    if total == 0 {
        return 0.0;
    }
    let zeros: u64 = counts
        .iter()
        .filter(|(bits, _)| bits.bytes().take(n).all(|b| b == b'0'))
        .map(|(_, c)| c)
        .sum();
    zeros as f64 / total as f64
}

/// Overlap of `a` and `b` by the SWAP test.
pub fn measure_swap_test(a: &Circuit, b: &Circuit, executor: &Executor, shots: u32) -> AlgoResult<f64> {
    executor.require_shots("the SWAP test")?;
    let counts = executor.run_counts_with_shots(&swap_test_circuit(a, b)?, shots)?;
    let fidelity = swap_fidelity_from_counts(&counts);
    debug!(a = a.name(), b = b.name(), fidelity, "swap test");
    Ok(fidelity)
}

/// Overlap of `a` and `b` by the destructive SWAP test.
pub fn measure_dswap_test(a: &Circuit, b: &Circuit, executor: &Executor, shots: u32) -> AlgoResult<f64> {
    executor.require_shots("the destructive SWAP test")?;
    let counts = executor.run_counts_with_shots(&dswap_test_circuit(a, b)?, shots)?;
    let fidelity = dswap_fidelity_from_counts(&counts, a.num_qubits());
    debug!(a = a.name(), b = b.name(), fidelity, "destructive swap test");
    Ok(fidelity)
}

/// Overlap of `a` and `b` as the all-zero probability of `b⁻¹·a`.
pub fn measure_amplitude_transition_test(
    a: &Circuit,
    b: &Circuit,
    executor: &Executor,
    shots: u32,
) -> AlgoResult<f64> {
    executor.require_shots("the amplitude transition test")?;
    let counts = executor.run_counts_with_shots(&amplitude_transition_circuit(a, b)?, shots)?;
    let fidelity = zero_probability_from_counts(&counts, a.num_qubits());
    debug!(a = a.name(), b = b.name(), fidelity, "amplitude transition test");
    Ok(fidelity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qexcite_adapter_sim::SimulatorBackend;
    use std::sync::Arc;

    const SHOTS: u32 = 10_000;

    fn executor(seed: u64) -> Executor {
        Executor::new(Arc::new(SimulatorBackend::new().with_seed(seed)), SHOTS).unwrap()
    }

    fn basis(label: &str) -> Circuit {
        let n = label.len() as u32;
        let mut c = Circuit::with_size(format!("ket_{label}"), n, 0);
        for (pos, ch) in label.chars().enumerate() {
            if ch == '1' {
                c.x(QubitId(n - 1 - pos as u32)).unwrap();
            }
        }
        c
    }

    fn plus() -> Circuit {
        let mut c = Circuit::with_size("plus", 1, 0);
        c.h(QubitId(0)).unwrap();
        c
    }

    #[test]
    fn test_swap_circuit_layout() {
        let c = swap_test_circuit(&basis("01"), &basis("10")).unwrap();
        assert_eq!(c.name(), "swap_test");
        assert_eq!(c.num_qubits(), 5);
        assert_eq!(c.num_clbits(), 1);
    }

    #[test]
    fn test_dswap_circuit_layout() {
        let c = dswap_test_circuit(&basis("01"), &basis("10")).unwrap();
        assert_eq!(c.name(), "dswap_test");
        assert_eq!(c.num_qubits(), 4);
        assert_eq!(c.num_clbits(), 4);
    }

    #[test]
    fn test_identical_states_overlap_one() {
        let exec = executor(10);
        for method in [
            OverlapMethod::Swap,
            OverlapMethod::DestructiveSwap,
            OverlapMethod::AmplitudeTransition,
        ] {
            for label in ["00", "01", "10", "11"] {
                let v = method.estimate(&basis(label), &basis(label), &exec, SHOTS).unwrap();
                assert_abs_diff_eq!(v, 1.0, epsilon = 0.02);
            }
            let v = method.estimate(&plus(), &plus(), &exec, SHOTS).unwrap();
            assert_abs_diff_eq!(v, 1.0, epsilon = 0.02);
        }
    }

    #[test]
    fn test_orthogonal_states_overlap_zero() {
        let exec = executor(11);
        for method in [
            OverlapMethod::Swap,
            OverlapMethod::DestructiveSwap,
            OverlapMethod::AmplitudeTransition,
        ] {
            let v = method.estimate(&basis("0"), &basis("1"), &exec, SHOTS).unwrap();
            assert_abs_diff_eq!(v, 0.0, epsilon = 0.04);
        }
    }

    #[test]
    fn test_half_overlap() {
        // |⟨0|+⟩|² = ½
        let exec = executor(12);
        let v = measure_swap_test(&basis("0"), &plus(), &exec, SHOTS).unwrap();
        assert_abs_diff_eq!(v, 0.5, epsilon = 0.03);
        let v = measure_amplitude_transition_test(&basis("0"), &plus(), &exec, SHOTS).unwrap();
        assert_abs_diff_eq!(v, 0.5, epsilon = 0.03);
    }

    #[test]
    fn test_width_mismatch() {
        assert!(matches!(
            swap_test_circuit(&basis("0"), &basis("00")),
            Err(AlgoError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_outcomes_count_as_zero() {
        let mut counts = Counts::new();
        counts.insert("1", 100);
        assert_abs_diff_eq!(swap_fidelity_from_counts(&counts), -1.0);

        let mut counts = Counts::new();
        counts.insert("00", 50);
        assert_abs_diff_eq!(dswap_fidelity_from_counts(&counts, 1), 1.0);
        assert_eq!(dswap_fidelity_from_counts(&Counts::new(), 1), 0.0);
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("dswap".parse::<OverlapMethod>().unwrap(), OverlapMethod::DestructiveSwap);
        assert_eq!("SWAP".parse::<OverlapMethod>().unwrap(), OverlapMethod::Swap);
        assert!("bell".parse::<OverlapMethod>().is_err());
        assert_eq!(OverlapMethod::AmplitudeTransition.to_string(), "amplitude");
    }

    #[test]
    fn test_requires_shot_execution() {
        let sim = SimulatorBackend::new()
            .with_managed_expectation()
            .with_shot_execution(false);
        let exec = Executor::new(Arc::new(sim), SHOTS).unwrap();
        assert!(matches!(
            measure_swap_test(&basis("0"), &basis("0"), &exec, SHOTS),
            Err(AlgoError::CapabilityMismatch { .. })
        ));
    }
}
