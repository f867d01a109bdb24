//! Simulator backend implementation.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use qexcite_hal::{
    Backend, BackendAvailability, BackendConfig, BackendFactory, Capabilities, Counts,
    ExecutionResult, HalError, HalResult, Job, JobId, JobStatus, ValidationResult,
};
use qexcite_ir::{Circuit, InstructionKind, PauliHamiltonian};

use crate::statevector::Statevector;

const DEFAULT_MAX_QUBITS: u32 = 20;

struct SimJob {
    job: Job,
    result: Option<ExecutionResult>,
}

/// Which qubit feeds each character of an outcome string.
struct Readout {
    /// `sources[c]` is the qubit recorded in classical bit `c`, if any.
    sources: Vec<Option<usize>>,
}

impl Readout {
    fn for_circuit(circuit: &Circuit) -> HalResult<Self> {
        let mut sources = vec![None; circuit.num_clbits()];
        let mut any = false;
        for inst in circuit.instructions()? {
            if matches!(inst.kind, InstructionKind::Measure) {
                any = true;
                for (q, c) in inst.qubits.iter().zip(&inst.clbits) {
                    sources[c.index()] = Some(q.index());
                }
            }
        }
        if !any {
            sources = (0..circuit.num_qubits()).map(Some).collect();
        }
        Ok(Self { sources })
    }

    fn bits(&self, basis_index: usize) -> Vec<bool> {
        self.sources
            .iter()
            .map(|src| src.is_some_and(|q| (basis_index >> q) & 1 == 1))
            .collect()
    }
}

fn to_bitstring(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

/// Local statevector simulator backend.
///
/// Each job is simulated once; shots are drawn from the final distribution
/// with a seedable generator, so runs with the same seed reproduce exactly.
/// Optionally models independent per-bit readout flips and answers
/// expectation queries directly from the statevector.
pub struct SimulatorBackend {
    config: BackendConfig,
    capabilities: Capabilities,
    jobs: Arc<Mutex<FxHashMap<String, SimJob>>>,
    rng: Mutex<StdRng>,
    readout_error: f64,
}

impl SimulatorBackend {
    /// Create a new simulator backend with default settings.
    pub fn new() -> Self {
        Self::with_max_qubits(DEFAULT_MAX_QUBITS)
    }

    /// Create a simulator with custom max qubits.
    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self {
            config: BackendConfig::new("simulator"),
            capabilities: Capabilities::simulator(max_qubits),
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            rng: Mutex::new(StdRng::from_entropy()),
            readout_error: 0.0,
        }
    }

    /// Fix the sampling seed.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Flip every reported bit independently with probability `p`.
    #[must_use]
    pub fn with_readout_error(mut self, p: f64) -> Self {
        self.readout_error = p;
        self.capabilities = self.capabilities.with_readout_error(p);
        self
    }

    /// Answer [`Backend::expectation`] exactly from the statevector.
    #[must_use]
    pub fn with_managed_expectation(mut self) -> Self {
        self.capabilities = self.capabilities.with_expectation();
        self
    }

    /// Enable or disable shot execution.
    #[must_use]
    pub fn with_shot_execution(mut self, enabled: bool) -> Self {
        self.capabilities = self.capabilities.with_shot_execution(enabled);
        self
    }

    fn lock_jobs(&self) -> std::sync::MutexGuard<'_, FxHashMap<String, SimJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_width(&self, circuit: &Circuit) -> HalResult<()> {
        if circuit.num_qubits() > self.capabilities.num_qubits as usize {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit has {} qubits but simulator only supports {}",
                circuit.num_qubits(),
                self.capabilities.num_qubits
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    fn run_simulation(&self, circuit: &Circuit, shots: u32) -> HalResult<ExecutionResult> {
        let start = Instant::now();
        let sv = Statevector::from_circuit(circuit)?;
        let readout = Readout::for_circuit(circuit)?;

        let mut cumulative = Vec::with_capacity(1 << sv.num_qubits());
        let mut acc = 0.0;
        for p in sv.probabilities() {
            acc += p;
            cumulative.push(acc);
        }
        let last = cumulative.len() - 1;

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut histogram: FxHashMap<usize, u64> = FxHashMap::default();
        for _ in 0..shots {
            let r = rng.r#gen::<f64>() * acc;
            let idx = cumulative.partition_point(|&c| c <= r).min(last);
            *histogram.entry(idx).or_insert(0) += 1;
        }

        let mut counts = Counts::new();
        for (idx, n) in histogram {
            let bits = readout.bits(idx);
            if self.readout_error > 0.0 {
                for _ in 0..n {
                    let noisy: Vec<bool> = bits
                        .iter()
                        .map(|&b| b ^ rng.gen_bool(self.readout_error))
                        .collect();
                    counts.insert(to_bitstring(&noisy), 1);
                }
            } else {
                counts.insert(to_bitstring(&bits), n);
            }
        }

        let elapsed = start.elapsed();
        debug!(
            qubits = circuit.num_qubits(),
            shots,
            outcomes = counts.len(),
            "simulation completed in {:?}",
            elapsed
        );
        Ok(ExecutionResult::new(counts, shots)
            .with_execution_time(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)))
    }
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        Ok(BackendAvailability::always_available())
    }

    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult> {
        let mut reasons = Vec::new();
        if let Err(e) = self.check_width(circuit) {
            reasons.push(e.to_string());
        }
        let free = circuit.parameters()?;
        if !free.is_empty() {
            reasons.push(format!("unbound parameters: {}", free.join(", ")));
        }
        Ok(if reasons.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid { reasons }
        })
    }

    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
        if !self.capabilities.supports_shots() {
            return Err(HalError::Unsupported(format!(
                "{} has shot execution disabled",
                self.name()
            )));
        }
        if shots == 0 || shots > self.capabilities.max_shots {
            return Err(HalError::InvalidShots(format!(
                "{shots} not in 1..={}",
                self.capabilities.max_shots
            )));
        }
        self.check_width(circuit)?;

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let mut job = Job::new(job_id.clone(), circuit.name(), shots);
        job.advance(JobStatus::Running)?;
        debug!("Submitted job: {}", job_id);

        let (status, result) = match self.run_simulation(circuit, shots) {
            Ok(result) => (JobStatus::Completed, Some(result)),
            Err(e) => {
                warn!(job = %job_id, "simulation failed: {e}");
                (JobStatus::Failed(e.to_string()), None)
            }
        };
        job.advance(status)?;
        self.lock_jobs()
            .insert(job_id.0.clone(), SimJob { job, result });

        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        self.lock_jobs()
            .get(&job_id.0)
            .map(|j| j.job.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        self.lock_jobs()
            .get(&job_id.0)
            .and_then(|j| j.result.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = self.lock_jobs();
        let sim_job = jobs
            .get_mut(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        sim_job.job.advance(JobStatus::Cancelled)
    }

    #[instrument(skip_all, fields(circuit = state.name()))]
    async fn expectation(&self, hamiltonian: &PauliHamiltonian, state: &Circuit) -> HalResult<f64> {
        if !self.capabilities.supports_expectation() {
            return Err(HalError::Unsupported(format!(
                "{} has managed expectation disabled",
                self.name()
            )));
        }
        if hamiltonian.num_qubits() != state.num_qubits() {
            return Err(HalError::InvalidCircuit(format!(
                "state has {} qubits, Hamiltonian acts on {}",
                state.num_qubits(),
                hamiltonian.num_qubits()
            )));
        }
        self.check_width(state)?;
        let sv = Statevector::from_circuit(state)?;
        let value = hamiltonian.expectation(sv.amplitudes());
        debug!(value, "exact expectation");
        Ok(value)
    }
}

impl BackendFactory for SimulatorBackend {
    /// Reads `max_qubits`, `seed`, `readout_error` and `managed_expectation`
    /// from the extra settings.
    fn from_config(config: BackendConfig) -> HalResult<Self> {
        let max_qubits = match config.extra_u64("max_qubits")? {
            Some(v) => u32::try_from(v)
                .map_err(|_| HalError::Configuration(format!("max_qubits {v} is too large")))?,
            None => DEFAULT_MAX_QUBITS,
        };

        let mut backend = Self::with_max_qubits(max_qubits);
        if let Some(seed) = config.extra_u64("seed")? {
            backend = backend.with_seed(seed);
        }
        if let Some(p) = config.extra_f64("readout_error")? {
            if !(0.0..=0.5).contains(&p) {
                return Err(HalError::Configuration(format!(
                    "readout_error {p} must lie in [0, 0.5]"
                )));
            }
            backend = backend.with_readout_error(p);
        }
        if config.extra_bool("managed_expectation")?.unwrap_or(false) {
            backend = backend.with_managed_expectation();
        }
        backend.capabilities.name = config.name.clone();
        backend.config = config;
        Ok(backend)
    }
}
