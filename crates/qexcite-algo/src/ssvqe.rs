//! Subspace-search VQE.
//!
//! One shared unitary U(θ) is trained to map the first `n_excited`
//! computational basis states onto the lowest eigenstates. Because the inputs
//! are orthogonal, so are the outputs, and the weighted cost
//!
//! ```text
//! Σᵢ wᵢ · ⟨i|U†(θ) H U(θ)|i⟩,   wᵢ = n_excited − i
//! ```
//!
//! orders them by energy. Training happens once, when the engine is built;
//! [`Ssvqe::run`] only reads the result.

use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use qexcite_ir::{Circuit, PauliHamiltonian, QubitId};

use crate::ansatz::Ansatz;
use crate::error::{AlgoError, AlgoResult};
use crate::executor::Executor;
use crate::observables::sample_hamiltonian;
use crate::optimizers::{OptimizationResult, Optimizer, minimize_fallible};

/// Settings for a subspace search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsvqeConfig {
    /// Number of lowest states to capture.
    pub n_excited: usize,
    /// Seed for the initial point; drawn from entropy when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SsvqeConfig {
    /// Capture the `n_excited` lowest states.
    pub fn new(n_excited: usize) -> Self {
        Self {
            n_excited,
            seed: None,
        }
    }

    /// Fix the initial-point seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Basis state `|index⟩` followed by the ansatz template.
///
/// The binary form of `index` is written most significant bit first, onto
/// qubit 0.
pub fn basis_circuit(index: usize, ansatz: &Ansatz) -> AlgoResult<Circuit> {
    let n = ansatz.num_qubits();
    if n < usize::BITS as usize && index >> n != 0 {
        return Err(AlgoError::IndexOutOfRange {
            index,
            len: 1 << n,
        });
    }
    let mut circuit = Circuit::with_size(format!("ssvqe_basis_{index}"), n as u32, 0);
    for q in 0..n {
        if (index >> (n - 1 - q)) & 1 == 1 {
            circuit.x(QubitId(q as u32))?;
        }
    }
    circuit.append(ansatz.template(), 0)?;
    Ok(circuit)
}

fn bind(template: &Circuit, ansatz: &Ansatz, params: &[f64]) -> AlgoResult<Circuit> {
    if params.len() != ansatz.num_parameters() {
        return Err(AlgoError::ParameterCountMismatch {
            expected: ansatz.num_parameters(),
            got: params.len(),
        });
    }
    Ok(template.bind_parameters(params)?)
}

/// Subspace-search engine.
pub struct Ssvqe {
    hamiltonian: PauliHamiltonian,
    ansatz: Ansatz,
    executor: Executor,
    config: SsvqeConfig,
    weights: Vec<f64>,
    optimal_parameters: Vec<f64>,
    optimization: OptimizationResult,
}

impl Ssvqe {
    /// Train the shared unitary with `optimizer`.
    ///
    /// This is the expensive step; it runs every objective evaluation to
    /// completion before returning.
    #[instrument(skip_all, fields(n_excited = config.n_excited))]
    pub fn new<O: Optimizer>(
        hamiltonian: PauliHamiltonian,
        ansatz: Ansatz,
        optimizer: O,
        executor: Executor,
        config: SsvqeConfig,
    ) -> AlgoResult<Self> {
        if hamiltonian.num_terms() == 0 {
            return Err(AlgoError::InvalidInput("Hamiltonian has no terms".into()));
        }
        let n = hamiltonian.num_qubits();
        if ansatz.num_qubits() != n {
            return Err(AlgoError::InvalidInput(format!(
                "ansatz acts on {} qubits, Hamiltonian on {n}",
                ansatz.num_qubits()
            )));
        }
        let max_states = if n < usize::BITS as usize { 1usize << n } else { usize::MAX };
        if config.n_excited == 0 || config.n_excited > max_states {
            return Err(AlgoError::InvalidInput(format!(
                "n_excited must be in 1..={max_states}, got {}",
                config.n_excited
            )));
        }

        let basis = (0..config.n_excited)
            .map(|i| basis_circuit(i, &ansatz))
            .collect::<AlgoResult<Vec<_>>>()?;
        let weights: Vec<f64> = (0..config.n_excited)
            .map(|i| (config.n_excited - i) as f64)
            .collect();

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let initial: Vec<f64> = (0..ansatz.num_parameters())
            .map(|_| rng.gen_range(0.0..TAU))
            .collect();

        let optimization = minimize_fallible(
            &optimizer,
            |params| {
                let mut cost = 0.0;
                for (template, w) in basis.iter().zip(&weights) {
                    let state = bind(template, &ansatz, params)?;
                    cost += w * sample_hamiltonian(&hamiltonian, &executor, &state)?;
                }
                Ok(cost)
            },
            initial,
        )?;
        info!(
            cost = optimization.optimal_value,
            evaluations = optimization.num_evaluations,
            "subspace training finished"
        );

        Ok(Self {
            hamiltonian,
            ansatz,
            executor,
            config,
            weights,
            optimal_parameters: optimization.optimal_params.clone(),
            optimization,
        })
    }

    /// Energy and bound circuit of the `index`-th lowest state found.
    ///
    /// Samples afresh on every call; the trained parameters never change.
    pub fn run(&self, index: usize) -> AlgoResult<(f64, Circuit)> {
        if index >= self.config.n_excited {
            return Err(AlgoError::IndexOutOfRange {
                index,
                len: self.config.n_excited,
            });
        }
        let template = basis_circuit(index, &self.ansatz)?;
        let state = bind(&template, &self.ansatz, &self.optimal_parameters)?;
        let energy = sample_hamiltonian(&self.hamiltonian, &self.executor, &state)?;
        Ok((energy, state))
    }

    /// Energies of every captured state, lowest first.
    pub fn energies(&self) -> AlgoResult<Vec<f64>> {
        (0..self.config.n_excited)
            .map(|i| self.run(i).map(|(e, _)| e))
            .collect()
    }

    /// The trained shared parameters.
    pub fn optimal_parameters(&self) -> &[f64] {
        &self.optimal_parameters
    }

    /// Statistics of the training run.
    pub fn optimization(&self) -> &OptimizationResult {
        &self.optimization
    }

    /// Cost weights, highest first.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Number of captured states.
    pub fn n_excited(&self) -> usize {
        self.config.n_excited
    }

    /// The executor.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hamiltonians::two_qubit_toy;
    use crate::optimizers::NelderMead;
    use approx::assert_abs_diff_eq;
    use qexcite_adapter_sim::SimulatorBackend;
    use std::sync::Arc;

    fn executor() -> Executor {
        Executor::new(Arc::new(SimulatorBackend::new().with_seed(3)), 500).unwrap()
    }

    fn quick(n_excited: usize) -> AlgoResult<Ssvqe> {
        Ssvqe::new(
            two_qubit_toy().unwrap(),
            Ansatz::two_local(2, 1).unwrap(),
            NelderMead::new().with_maxiter(0),
            executor(),
            SsvqeConfig::new(n_excited).with_seed(1),
        )
    }

    #[test]
    fn test_basis_encoding_is_msb_first_on_qubit_zero() {
        let ansatz = Ansatz::two_local(2, 0).unwrap();
        // index 1 = "01": qubit 0 gets 0, qubit 1 gets 1.
        let c = basis_circuit(1, &ansatz).unwrap();
        assert_eq!(c.name(), "ssvqe_basis_1");
        let xs: Vec<u32> = c
            .instructions()
            .unwrap()
            .into_iter()
            .filter(|i| i.kind.name() == "x")
            .map(|i| i.qubits[0].0)
            .collect();
        assert_eq!(xs, vec![1]);
        assert_eq!(c.parameters().unwrap(), ansatz.parameters());
    }

    #[test]
    fn test_n_excited_bounds() {
        assert!(matches!(quick(0), Err(AlgoError::InvalidInput(_))));
        assert!(matches!(quick(5), Err(AlgoError::InvalidInput(_))));
        assert!(quick(4).is_ok());
    }

    #[test]
    fn test_weights_descend() {
        let ssvqe = quick(3).unwrap();
        assert_eq!(ssvqe.weights(), [3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_run_index_out_of_range() {
        let ssvqe = quick(2).unwrap();
        assert!(matches!(
            ssvqe.run(2),
            Err(AlgoError::IndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_run_does_not_retrain() {
        let ssvqe = quick(2).unwrap();
        let before = ssvqe.optimal_parameters().to_vec();
        let (first_energy, first) = ssvqe.run(1).unwrap();
        let (second_energy, second) = ssvqe.run(1).unwrap();
        assert_eq!(ssvqe.optimal_parameters(), before.as_slice());
        // Same bound angles, so only shot noise separates the energies.
        assert_eq!(
            format!("{:?}", first.instructions().unwrap()),
            format!("{:?}", second.instructions().unwrap())
        );
        assert_abs_diff_eq!(first_energy, second_energy, epsilon = 0.3);
    }
}
