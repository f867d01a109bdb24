//! Backend capability description.
//!
//! Capabilities are fixed when a backend is constructed and read
//! synchronously. The variational layer resolves them exactly once, when it
//! wraps a backend in an executor, to decide how energies are obtained.

use serde::{Deserialize, Serialize};

/// How a backend can be asked for numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionModes {
    /// Runs circuits for a number of shots and returns counts.
    pub shot_execution: bool,
    /// Evaluates ⟨ψ|H|ψ⟩ for a Hamiltonian and a state-preparation circuit.
    pub expectation: bool,
}

/// Hardware or simulator capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Number of qubits available.
    pub num_qubits: u32,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Whether this is a simulator.
    pub is_simulator: bool,
    /// Supported execution modes.
    pub modes: ExecutionModes,
    /// Per-bit readout flip probability, if the backend models one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readout_error: Option<f64>,
    /// Free-form feature flags such as `"statevector"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Capabilities {
    /// Capabilities of a shot-sampling statevector simulator.
    pub fn simulator(num_qubits: u32) -> Self {
        Self {
            name: "simulator".into(),
            num_qubits,
            max_shots: 1_000_000,
            is_simulator: true,
            modes: ExecutionModes {
                shot_execution: true,
                expectation: false,
            },
            readout_error: None,
            features: vec!["statevector".into()],
        }
    }

    /// Advertise managed expectation evaluation.
    #[must_use]
    pub fn with_expectation(mut self) -> Self {
        self.modes.expectation = true;
        self
    }

    /// Advertise or withdraw shot execution.
    #[must_use]
    pub fn with_shot_execution(mut self, enabled: bool) -> Self {
        self.modes.shot_execution = enabled;
        self
    }

    /// Record a readout flip probability.
    #[must_use]
    pub fn with_readout_error(mut self, p: f64) -> Self {
        self.readout_error = Some(p);
        self
    }

    /// Check whether the backend returns counts.
    pub fn supports_shots(&self) -> bool {
        self.modes.shot_execution
    }

    /// Check whether the backend evaluates expectations itself.
    pub fn supports_expectation(&self) -> bool {
        self.modes.expectation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulator_capabilities() {
        let caps = Capabilities::simulator(8);
        assert!(caps.supports_shots());
        assert!(!caps.supports_expectation());
        assert!(caps.is_simulator);
        assert_eq!(caps.num_qubits, 8);
    }

    #[test]
    fn test_builders() {
        let caps = Capabilities::simulator(2)
            .with_expectation()
            .with_shot_execution(false)
            .with_readout_error(0.01);
        assert!(caps.supports_expectation());
        assert!(!caps.supports_shots());
        assert_eq!(caps.readout_error, Some(0.01));
    }
}
