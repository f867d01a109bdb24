//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors raised while building, composing or binding circuits and operators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit not present in the circuit.
    #[error("Qubit {qubit} not found in circuit{}", format_gate_context(.gate_name))]
    QubitNotFound {
        /// The missing qubit.
        qubit: QubitId,
        /// Gate that referenced it, if any.
        gate_name: Option<String>,
    },

    /// Classical bit not present in the circuit.
    #[error("Classical bit {clbit} not found in circuit{}", format_gate_context(.gate_name))]
    ClbitNotFound {
        /// The missing classical bit.
        clbit: ClbitId,
        /// Gate that referenced it, if any.
        gate_name: Option<String>,
    },

    /// Invalid DAG structure.
    #[error("Invalid DAG structure: {0}")]
    InvalidDag(String),

    /// Gate applied to the wrong number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Same qubit used twice by one instruction.
    #[error("Duplicate qubit {qubit} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicated qubit.
        qubit: QubitId,
        /// Gate that referenced it, if any.
        gate_name: Option<String>,
    },

    /// Parameter is unbound where a concrete value is needed.
    #[error("Parameter '{0}' is unbound")]
    UnboundParameter(String),

    /// Value vector does not match the circuit's free parameters.
    #[error("Circuit has {expected} free parameters, got {got} values")]
    ParameterCountMismatch {
        /// Number of free parameters.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },

    /// Operation requires a unitary circuit.
    #[error("Instruction '{0}' is not unitary and cannot be inverted")]
    NonUnitary(String),

    /// Composed circuit does not fit into the target.
    #[error("Cannot place a {width}-qubit circuit at offset {offset} in a {target}-qubit circuit")]
    CompositionOutOfRange {
        /// Width of the appended circuit.
        width: u32,
        /// Requested qubit offset.
        offset: u32,
        /// Width of the target circuit.
        target: u32,
    },

    /// Malformed Pauli label.
    #[error("Invalid Pauli label '{label}': {reason}")]
    InvalidPauliLabel {
        /// The offending label.
        label: String,
        /// What is wrong with it.
        reason: String,
    },
}

#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
