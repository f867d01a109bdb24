//! Hardware abstraction layer for qexcite.
//!
//! This crate provides the interface the variational engines use to run
//! circuits:
//! - A common [`Backend`] trait for job submission and management
//! - [`Capabilities`] describing which execution modes a backend offers
//! - Shot results via [`ExecutionResult`] and [`Counts`]
//!
//! A backend offers raw shot execution, managed expectation evaluation, or
//! both. Engines never inspect the concrete backend type; they read
//! [`Capabilities::modes`] once.
//!
//! # Example: Running a Circuit
//!
//! ```ignore
//! use qexcite_hal::Backend;
//! use qexcite_adapter_sim::SimulatorBackend;
//! use qexcite_ir::Circuit;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let circuit = Circuit::bell()?;
//!     let backend = SimulatorBackend::new();
//!
//!     let job_id = backend.submit(&circuit, 1000).await?;
//!     let result = backend.wait(&job_id).await?;
//!
//!     if let Some((bitstring, count)) = result.counts.most_frequent() {
//!         println!("Most frequent: {bitstring} ({count} times)");
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod capability;
pub mod error;
pub mod job;
pub mod result;

pub use backend::{
    Backend, BackendAvailability, BackendConfig, BackendFactory, ValidationResult,
};
pub use capability::{Capabilities, ExecutionModes};
pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use result::{Counts, ExecutionResult};
