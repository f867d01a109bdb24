//! Variational quantum deflation.
//!
//! States are found one at a time, lowest first. While searching state `i`
//! the objective is
//!
//! ```text
//! E(θ) + β · Σ_{j < i} |⟨ψ(θ)|ψ_j⟩|²
//! ```
//!
//! where `ψ_j` are the states accepted so far, in discovery order. The
//! overlap protocol is fixed when the engine is built.

use std::f64::consts::TAU;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use qexcite_ir::{Circuit, PauliHamiltonian};

use crate::ansatz::Ansatz;
use crate::error::{AlgoError, AlgoResult};
use crate::executor::Executor;
use crate::observables::sample_hamiltonian;
use crate::optimizers::{Optimizer, minimize_fallible};
use crate::overlap::OverlapMethod;

/// Settings for a deflation run.
///
/// `beta` weighs the overlap penalty against the energy. It has no default:
/// it must exceed the gap between the sought state and the states below it,
/// otherwise the search may settle back onto an accepted state. A safe
/// choice is a few times the spread of the spectrum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VqdConfig {
    /// Excited states to find on top of the ground state.
    pub n_excited_states: usize,
    /// Overlap penalty weight.
    pub beta: f64,
    /// Overlap protocol.
    #[serde(default)]
    pub overlap: OverlapMethod,
    /// Shots per overlap circuit; the executor default when unset.
    #[serde(default)]
    pub overlap_shots: Option<u32>,
    /// Seed for initial points; drawn from entropy when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl VqdConfig {
    /// Configuration searching `n_excited_states + 1` states with penalty `beta`.
    pub fn new(n_excited_states: usize, beta: f64) -> Self {
        Self {
            n_excited_states,
            beta,
            overlap: OverlapMethod::default(),
            overlap_shots: None,
            seed: None,
        }
    }

    /// Select the overlap protocol.
    #[must_use]
    pub fn with_overlap(mut self, overlap: OverlapMethod) -> Self {
        self.overlap = overlap;
        self
    }

    /// Set shots per overlap circuit.
    #[must_use]
    pub fn with_overlap_shots(mut self, shots: u32) -> Self {
        self.overlap_shots = Some(shots);
        self
    }

    /// Fix the initial-point seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the settings on their own.
    pub fn validate(&self) -> AlgoResult<()> {
        if !(self.beta.is_finite() && self.beta > 0.0) {
            return Err(AlgoError::InvalidInput(format!(
                "beta must be finite and positive, got {}",
                self.beta
            )));
        }
        if self.overlap_shots == Some(0) {
            return Err(AlgoError::InvalidInput("overlap_shots must be positive".into()));
        }
        Ok(())
    }
}

/// One state found by the deflation search.
#[derive(Debug, Clone)]
pub struct AcceptedState {
    /// Penalized objective value at the optimum.
    pub energy: f64,
    /// ⟨ψ|H|ψ⟩ of `state`, sampled again after the search without the penalty.
    ///
    /// The penalized `energy` of an excited state tends to sit below this,
    /// since the optimizer is drawn to points where the overlap estimate
    /// comes out negative.
    pub sampled_energy: f64,
    /// The bound ansatz circuit.
    pub state: Circuit,
    /// Parameters that produced `state`.
    pub params: Vec<f64>,
    /// Objective evaluations spent on this state.
    pub evaluations: usize,
}

/// Deflation search engine.
pub struct Vqd<O> {
    hamiltonian: PauliHamiltonian,
    ansatz: Ansatz,
    optimizer: O,
    executor: Executor,
    config: VqdConfig,
    rng: StdRng,
    accepted: Vec<AcceptedState>,
}

impl<O: Optimizer> Vqd<O> {
    /// Build an engine; nothing runs until [`Vqd::run`].
    pub fn new(
        hamiltonian: PauliHamiltonian,
        ansatz: Ansatz,
        optimizer: O,
        executor: Executor,
        config: VqdConfig,
    ) -> AlgoResult<Self> {
        config.validate()?;
        if hamiltonian.num_terms() == 0 {
            return Err(AlgoError::InvalidInput("Hamiltonian has no terms".into()));
        }
        if ansatz.num_qubits() != hamiltonian.num_qubits() {
            return Err(AlgoError::InvalidInput(format!(
                "ansatz acts on {} qubits, Hamiltonian on {}",
                ansatz.num_qubits(),
                hamiltonian.num_qubits()
            )));
        }
        let dim = 1u128 << hamiltonian.num_qubits().min(127);
        if config.n_excited_states as u128 >= dim {
            return Err(AlgoError::InvalidInput(format!(
                "{} states requested from a {dim}-dimensional space",
                config.n_excited_states + 1
            )));
        }
        if config.n_excited_states > 0 {
            executor.require_shots("overlap estimation")?;
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            hamiltonian,
            ansatz,
            optimizer,
            executor,
            config,
            rng,
            accepted: Vec::new(),
        })
    }

    /// Search the ground state and `n_excited_states` excited states.
    ///
    /// Previously accepted states are discarded first.
    pub fn run(&mut self) -> AlgoResult<&[AcceptedState]> {
        self.run_with_progress(|_, _| {})
    }

    /// [`Vqd::run`], calling `on_accept(index, state)` as each state is accepted.
    #[instrument(skip_all, fields(states = self.config.n_excited_states + 1, overlap = %self.config.overlap))]
    pub fn run_with_progress<P>(&mut self, mut on_accept: P) -> AlgoResult<&[AcceptedState]>
    where
        P: FnMut(usize, &AcceptedState),
    {
        self.accepted.clear();
        for index in 0..=self.config.n_excited_states {
            let initial: Vec<f64> = (0..self.ansatz.num_parameters())
                .map(|_| self.rng.gen_range(0.0..TAU))
                .collect();
            let state = self.search(index, initial)?;
            info!(
                index,
                energy = state.energy,
                sampled_energy = state.sampled_energy,
                evaluations = state.evaluations,
                "accepted state"
            );
            on_accept(index, &state);
            self.accepted.push(state);
        }
        Ok(&self.accepted)
    }

    fn search(&self, index: usize, initial: Vec<f64>) -> AlgoResult<AcceptedState> {
        let result = minimize_fallible(&self.optimizer, |params| self.cost_function(params), initial)?;
        let state = self
            .ansatz
            .bind(&result.optimal_params)?
            .with_name(format!("vqd_state_{index}"));
        let sampled_energy = sample_hamiltonian(&self.hamiltonian, &self.executor, &state)?;
        Ok(AcceptedState {
            energy: result.optimal_value,
            sampled_energy,
            state,
            params: result.optimal_params,
            evaluations: result.num_evaluations,
        })
    }

    /// Energy of `params` plus β times its overlap with every accepted state.
    pub fn cost_function(&self, params: &[f64]) -> AlgoResult<f64> {
        let state = self.ansatz.bind(params)?;
        let energy = sample_hamiltonian(&self.hamiltonian, &self.executor, &state)?;

        let shots = self.config.overlap_shots.unwrap_or(self.executor.shots());
        let mut overlap = 0.0;
        for accepted in &self.accepted {
            overlap += self
                .config
                .overlap
                .estimate(&state, &accepted.state, &self.executor, shots)?;
        }
        let cost = energy + self.config.beta * overlap;
        debug!(energy, overlap, cost, "vqd objective");
        Ok(cost)
    }

    /// Energies of the accepted states, in discovery order.
    pub fn energies(&self) -> Vec<f64> {
        self.accepted.iter().map(|s| s.energy).collect()
    }

    /// Unpenalized energies of the accepted states, in discovery order.
    pub fn sampled_energies(&self) -> Vec<f64> {
        self.accepted.iter().map(|s| s.sampled_energy).collect()
    }

    /// Circuits of the accepted states, in discovery order.
    pub fn states(&self) -> Vec<&Circuit> {
        self.accepted.iter().map(|s| &s.state).collect()
    }

    /// Everything recorded for the accepted states.
    pub fn accepted(&self) -> &[AcceptedState] {
        &self.accepted
    }

    /// The run configuration.
    pub fn config(&self) -> &VqdConfig {
        &self.config
    }

    /// The Hamiltonian being diagonalized.
    pub fn hamiltonian(&self) -> &PauliHamiltonian {
        &self.hamiltonian
    }

    /// The ansatz.
    pub fn ansatz(&self) -> &Ansatz {
        &self.ansatz
    }

    /// The executor.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }
}

impl<O: fmt::Debug> fmt::Debug for Vqd<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vqd")
            .field("num_qubits", &self.hamiltonian.num_qubits())
            .field("ansatz", &self.ansatz.template().name())
            .field("optimizer", &self.optimizer)
            .field("executor", &self.executor)
            .field("config", &self.config)
            .field("accepted", &self.accepted.len())
            .finish()
    }
}
