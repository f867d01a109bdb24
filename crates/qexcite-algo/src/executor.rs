//! Blocking, capability-resolved access to a backend.
//!
//! The variational engines are synchronous: every objective evaluation runs
//! its circuits to completion before returning. [`Executor`] owns a
//! current-thread tokio runtime and drives `submit → wait` with `block_on`.
//! It must not be called from inside another async runtime.

use std::fmt;
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use tracing::{debug, warn};

use qexcite_hal::{Backend, Counts, HalError, ValidationResult};
use qexcite_ir::{Circuit, PauliHamiltonian};

use crate::error::{AlgoError, AlgoResult};

/// Default number of shots per circuit.
pub const DEFAULT_SHOTS: u32 = 10_000;

/// How the executor evaluates ⟨ψ|H|ψ⟩.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyPath {
    /// Group commuting terms, measure, and average parities.
    Sampled,
    /// Ask the backend for the expectation value directly.
    Managed,
}

impl fmt::Display for EnergyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnergyPath::Sampled => write!(f, "sampled"),
            EnergyPath::Managed => write!(f, "managed"),
        }
    }
}

/// A backend handle whose capabilities were resolved once, at construction.
pub struct Executor {
    backend: Arc<dyn Backend>,
    runtime: Runtime,
    shots: u32,
    energy_path: EnergyPath,
    shot_execution: bool,
}

impl Executor {
    /// Wrap `backend`, preferring managed expectation when it is offered.
    pub fn new(backend: Arc<dyn Backend>, shots: u32) -> AlgoResult<Self> {
        let caps = backend.capabilities();
        let path = if caps.supports_expectation() {
            EnergyPath::Managed
        } else {
            EnergyPath::Sampled
        };
        Self::with_energy_path(backend, shots, path)
    }

    /// Wrap `backend` with an explicit energy path.
    pub fn with_energy_path(
        backend: Arc<dyn Backend>,
        shots: u32,
        energy_path: EnergyPath,
    ) -> AlgoResult<Self> {
        let caps = backend.capabilities();
        let shot_execution = caps.supports_shots();

        if !shot_execution && !caps.supports_expectation() {
            return Err(AlgoError::CapabilityMismatch {
                backend: backend.name().to_string(),
                required: "shot execution or expectation evaluation".into(),
            });
        }
        match energy_path {
            EnergyPath::Managed if !caps.supports_expectation() => {
                return Err(AlgoError::CapabilityMismatch {
                    backend: backend.name().to_string(),
                    required: "managed expectation evaluation".into(),
                });
            }
            EnergyPath::Sampled if !shot_execution => {
                return Err(AlgoError::CapabilityMismatch {
                    backend: backend.name().to_string(),
                    required: "shot execution".into(),
                });
            }
            _ => {}
        }
        if shot_execution {
            if shots == 0 || shots > caps.max_shots {
                return Err(AlgoError::InvalidInput(format!(
                    "shots must be in 1..={}, got {shots}",
                    caps.max_shots
                )));
            }
        } else {
            warn!(
                backend = backend.name(),
                "backend has no shot execution; overlap tests are unavailable"
            );
        }

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AlgoError::Backend(HalError::Backend(e.to_string())))?;

        let availability = runtime.block_on(backend.availability())?;
        if !availability.is_available {
            return Err(AlgoError::Backend(HalError::BackendUnavailable(
                availability
                    .status_message
                    .unwrap_or_else(|| backend.name().to_string()),
            )));
        }

        debug!(backend = backend.name(), %energy_path, shots, "executor ready");
        Ok(Self {
            backend,
            runtime,
            shots,
            energy_path,
            shot_execution,
        })
    }

    /// Name of the wrapped backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Default shot count.
    pub fn shots(&self) -> u32 {
        self.shots
    }

    /// How energies are evaluated.
    pub fn energy_path(&self) -> EnergyPath {
        self.energy_path
    }

    /// Whether circuits can be sampled.
    pub fn supports_shots(&self) -> bool {
        self.shot_execution
    }

    pub(crate) fn require_shots(&self, purpose: &str) -> AlgoResult<()> {
        if self.shot_execution {
            Ok(())
        } else {
            Err(AlgoError::CapabilityMismatch {
                backend: self.backend.name().to_string(),
                required: format!("shot execution for {purpose}"),
            })
        }
    }

    /// Run `circuit` with the default shot count.
    pub fn run_counts(&self, circuit: &Circuit) -> AlgoResult<Counts> {
        self.run_counts_with_shots(circuit, self.shots)
    }

    /// Validate, submit and wait for `circuit`.
    pub fn run_counts_with_shots(&self, circuit: &Circuit, shots: u32) -> AlgoResult<Counts> {
        self.require_shots("sampling")?;
        debug!(
            circuit = circuit.name(),
            qubits = circuit.num_qubits(),
            shots,
            "submitting circuit"
        );
        let backend = Arc::clone(&self.backend);
        let result = self.runtime.block_on(async move {
            if let ValidationResult::Invalid { reasons } = backend.validate(circuit).await? {
                return Err(HalError::InvalidCircuit(reasons.join("; ")));
            }
            let job_id = backend.submit(circuit, shots).await?;
            backend.wait(&job_id).await
        })?;
        Ok(result.counts)
    }

    /// ⟨ψ|H|ψ⟩ from the backend's managed expectation evaluation.
    pub fn expectation(&self, hamiltonian: &PauliHamiltonian, state: &Circuit) -> AlgoResult<f64> {
        if self.energy_path != EnergyPath::Managed {
            return Err(AlgoError::CapabilityMismatch {
                backend: self.backend.name().to_string(),
                required: "managed expectation evaluation".into(),
            });
        }
        debug!(circuit = state.name(), "requesting expectation value");
        Ok(self
            .runtime
            .block_on(self.backend.expectation(hamiltonian, state))?)
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("backend", &self.backend.name())
            .field("shots", &self.shots)
            .field("energy_path", &self.energy_path)
            .field("shot_execution", &self.shot_execution)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qexcite_adapter_sim::SimulatorBackend;
    use qexcite_ir::QubitId;

    #[test]
    fn test_prefers_managed_expectation() {
        let sim = SimulatorBackend::new().with_managed_expectation();
        let exec = Executor::new(Arc::new(sim), 100).unwrap();
        assert_eq!(exec.energy_path(), EnergyPath::Managed);
        assert!(exec.supports_shots());
    }

    #[test]
    fn test_falls_back_to_sampling() {
        let exec = Executor::new(Arc::new(SimulatorBackend::new()), 100).unwrap();
        assert_eq!(exec.energy_path(), EnergyPath::Sampled);
    }

    #[test]
    fn test_rejects_backend_without_modes() {
        let sim = SimulatorBackend::new().with_shot_execution(false);
        let err = Executor::new(Arc::new(sim), 100).unwrap_err();
        assert!(matches!(err, AlgoError::CapabilityMismatch { .. }));
    }

    #[test]
    fn test_rejects_forced_managed_path() {
        let err =
            Executor::with_energy_path(Arc::new(SimulatorBackend::new()), 100, EnergyPath::Managed)
                .unwrap_err();
        assert!(matches!(err, AlgoError::CapabilityMismatch { .. }));
    }

    #[test]
    fn test_rejects_zero_shots() {
        let err = Executor::new(Arc::new(SimulatorBackend::new()), 0).unwrap_err();
        assert!(matches!(err, AlgoError::InvalidInput(_)));
    }

    #[test]
    fn test_run_counts() {
        let exec = Executor::new(Arc::new(SimulatorBackend::new().with_seed(1)), 500).unwrap();
        let mut c = Circuit::with_size("x", 1, 1);
        c.x(QubitId(0)).unwrap();
        c.measure_all().unwrap();
        let counts = exec.run_counts(&c).unwrap();
        assert_eq!(counts.get("1"), 500);
    }

    #[test]
    fn test_expectation_only_backend_cannot_sample() {
        let sim = SimulatorBackend::new()
            .with_managed_expectation()
            .with_shot_execution(false);
        let exec = Executor::new(Arc::new(sim), 100).unwrap();
        let c = Circuit::with_size("empty", 1, 0);
        assert!(matches!(
            exec.run_counts(&c),
            Err(AlgoError::CapabilityMismatch { .. })
        ));
    }
}
