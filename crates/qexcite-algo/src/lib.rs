//! Variational excited-state search for qexcite.
//!
//! This crate provides two engines that find the low-lying spectrum of a
//! Pauli-sum Hamiltonian on a shot-based backend:
//!
//! - [`Vqd`]: variational quantum deflation, one state at a time, with an
//!   overlap penalty against every state already accepted
//! - [`Ssvqe`]: subspace-search VQE, one shared unitary trained on orthogonal
//!   basis inputs
//!
//! Around them sit the pieces they share: the grouped Hamiltonian sampler
//! ([`observables`]), SWAP-family overlap estimators ([`overlap`]), ansatz
//! templates, gradient-free optimizers and an exact [`classical_solver`]
//! for reference values.
//!
//! # Example: Two Lowest States
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use qexcite_adapter_sim::SimulatorBackend;
//! use qexcite_algo::{
//!     Ansatz, Executor, NelderMead, OverlapMethod, Vqd, VqdConfig, classical_solver,
//!     hamiltonians::two_qubit_toy,
//! };
//!
//! # fn main() -> Result<(), qexcite_algo::AlgoError> {
//! let hamiltonian = two_qubit_toy()?;
//! let executor = Executor::new(Arc::new(SimulatorBackend::new().with_seed(7)), 10_000)?;
//! let config = VqdConfig::new(1, 3.0)
//!     .with_overlap(OverlapMethod::Swap)
//!     .with_seed(7);
//!
//! let mut vqd = Vqd::new(
//!     hamiltonian.clone(),
//!     Ansatz::two_local(2, 1)?,
//!     NelderMead::new().with_maxiter(300),
//!     executor,
//!     config,
//! )?;
//! vqd.run()?;
//!
//! let exact = classical_solver(&hamiltonian)?;
//! println!("found {:?}, exact {:?}", vqd.energies(), exact.lowest(2));
//! # Ok(())
//! # }
//! ```
//!
//! Executors block on a private current-thread runtime and must not be
//! driven from inside another async runtime.

pub mod ansatz;
pub mod classical;
pub mod config;
pub mod error;
pub mod executor;
pub mod hamiltonians;
pub mod observables;
pub mod optimizers;
pub mod overlap;
pub mod ssvqe;
pub mod vqd;

pub use ansatz::{Ansatz, AnsatzKind};
pub use classical::{Spectrum, classical_solver};
pub use config::{ConfigError, RunConfig};
pub use error::{AlgoError, AlgoResult};
pub use executor::{EnergyPath, Executor};
pub use observables::{
    measure_iz, measure_pauli_string, measure_xx, measure_yy, measure_zi, measure_zz,
    sample_hamiltonian,
};
pub use optimizers::{NelderMead, OptimizationResult, Optimizer, OptimizerChoice, Spsa};
pub use overlap::{
    OverlapMethod, measure_amplitude_transition_test, measure_dswap_test, measure_swap_test,
};
pub use ssvqe::{Ssvqe, SsvqeConfig};
pub use vqd::{AcceptedState, Vqd, VqdConfig};
