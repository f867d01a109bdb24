//! Local statevector simulator for qexcite.
//!
//! The simulator evolves the full statevector once per job and then samples
//! shots from the final distribution. That makes it exact up to shot noise
//! and limited to roughly 20 to 25 qubits.
//!
//! # Features
//!
//! - **Seedable sampling**: [`SimulatorBackend::with_seed`] makes counts reproducible
//! - **Readout noise**: [`SimulatorBackend::with_readout_error`] flips reported bits
//! - **Managed expectation**: [`SimulatorBackend::with_managed_expectation`] answers
//!   ⟨ψ|H|ψ⟩ exactly, without shots
//! - **Classical-bit outcomes**: character `i` of a bitstring is classical bit `i`;
//!   circuits without measurements report every qubit
//!
//! # Performance
//!
//! | Qubits | Memory | Simulation Speed |
//! |--------|--------|------------------|
//! | 10 | ~16 KB | Instant |
//! | 15 | ~512 KB | Fast |
//! | 20 | ~16 MB | Moderate |
//! | 25 | ~512 MB | Slow |
//!
//! # Example
//!
//! ```ignore
//! use qexcite_adapter_sim::SimulatorBackend;
//! use qexcite_hal::Backend;
//! use qexcite_ir::Circuit;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SimulatorBackend::new().with_seed(7);
//!     let circuit = Circuit::bell()?;
//!     let job_id = backend.submit(&circuit, 1000).await?;
//!     let result = backend.wait(&job_id).await?;
//!     println!("Results: {:?}", result.counts);
//!     Ok(())
//! }
//! ```

mod simulator;
mod statevector;

pub use simulator::SimulatorBackend;
pub use statevector::Statevector;
