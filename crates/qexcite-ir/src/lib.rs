//! Circuit and operator representation for qexcite.
//!
//! This crate provides the data structures the variational engines work on:
//! parameterized circuits and weighted Pauli-string Hamiltonians.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`]
//! - **Gates**: [`StandardGate`] for the built-in gate set
//! - **Parameters**: [`ParameterExpression`] for symbolic angles in ansatz templates
//! - **Instructions**: [`Instruction`] combining gates with their operands
//! - **DAG**: [`CircuitDag`] for the internal graph representation
//! - **Circuit**: [`Circuit`] builder with composition, inversion and binding
//! - **Operators**: [`PauliHamiltonian`] and [`PauliTerm`]
//!
//! # Example: Binding a Template
//!
//! ```rust
//! use qexcite_ir::{Circuit, ParameterExpression, QubitId};
//!
//! let mut template = Circuit::with_size("ansatz", 1, 0);
//! template.ry(ParameterExpression::symbol("b"), QubitId(0)).unwrap();
//! template.rz(ParameterExpression::symbol("a"), QubitId(0)).unwrap();
//!
//! // Values bind against the sorted names: a = 0.1, b = 0.2.
//! let bound = template.bind_parameters(&[0.1, 0.2]).unwrap();
//! assert!(!bound.is_parameterized().unwrap());
//! assert!(template.is_parameterized().unwrap());
//! ```
//!
//! # Example: Hamiltonian from Labels
//!
//! ```rust
//! use qexcite_ir::PauliHamiltonian;
//!
//! let h = PauliHamiltonian::from_labels(&[("ZI", 0.5), ("ZZ", 0.5)]).unwrap();
//! assert_eq!(h.num_qubits(), 2);
//! assert_eq!(h.to_matrix().len(), 16);
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `H` | 1 | Hadamard gate |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `S`, `Sdg` | 1 | S and S-dagger gates |
//! | `T`, `Tdg` | 1 | T and T-dagger gates |
//! | `SX`, `SXdg` | 1 | sqrt(X) and its adjoint |
//! | `Rx`, `Ry`, `Rz`, `P` | 1 | Rotation and phase gates |
//! | `CX`, `CY`, `CZ` | 2 | Controlled Paulis |
//! | `Swap` | 2 | SWAP gate |
//! | `CRz`, `CP` | 2 | Controlled rotation and phase |
//! | `CCX` | 3 | Toffoli gate |
//! | `CSwap` | 3 | Fredkin gate |

pub mod circuit;
pub mod dag;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod parameter;
pub mod pauli;
pub mod qubit;

pub use circuit::Circuit;
pub use dag::{CircuitDag, DagEdge, DagNode, NodeIndex, WireId};
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::{Instruction, InstructionKind};
pub use parameter::ParameterExpression;
pub use pauli::{Pauli, PauliHamiltonian, PauliTerm};
pub use qubit::{ClbitId, QubitId};
