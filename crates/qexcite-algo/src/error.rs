//! Error types for the variational algorithms.

use thiserror::Error;

use qexcite_hal::HalError;
use qexcite_ir::IrError;

/// Errors raised while configuring or running an algorithm.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AlgoError {
    /// A parameter vector does not match the ansatz.
    #[error("Expected {expected} parameters, got {got}")]
    ParameterCountMismatch {
        /// Number of free parameters in the ansatz.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },

    /// A state index past the end of the computed spectrum.
    #[error("Index {index} out of range for {len} states")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of available states.
        len: usize,
    },

    /// Arguments that can never produce a valid run.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A numerical routine failed to produce a result.
    #[error("Computation failed: {0}")]
    Computation(String),

    /// The backend cannot serve the requested execution mode.
    #[error("Backend '{backend}' does not support {required}")]
    CapabilityMismatch {
        /// Backend name.
        backend: String,
        /// What the algorithm needed.
        required: String,
    },

    /// Backend or job failure.
    #[error(transparent)]
    Backend(#[from] HalError),

    /// Circuit construction or binding failure.
    #[error(transparent)]
    Circuit(#[from] IrError),
}

/// Result type for algorithm operations.
pub type AlgoResult<T> = Result<T, AlgoError>;
