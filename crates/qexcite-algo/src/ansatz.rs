//! Parameterized circuit templates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use qexcite_ir::{Circuit, ParameterExpression, QubitId};

use crate::error::{AlgoError, AlgoResult};

/// Named ansatz families that can be built from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnsatzKind {
    /// RY·RZ layers with a linear CX chain.
    #[default]
    TwoLocal,
    /// RY·RZ layers with a linear CZ chain.
    HardwareEfficient,
}

impl FromStr for AnsatzKind {
    type Err = AlgoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "two_local" => Ok(AnsatzKind::TwoLocal),
            "hardware_efficient" => Ok(AnsatzKind::HardwareEfficient),
            other => Err(AlgoError::InvalidInput(format!("unknown ansatz '{other}'"))),
        }
    }
}

impl fmt::Display for AnsatzKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnsatzKind::TwoLocal => write!(f, "two_local"),
            AnsatzKind::HardwareEfficient => write!(f, "hardware_efficient"),
        }
    }
}

#[derive(Clone, Copy)]
enum Entangler {
    Cx,
    Cz,
}

/// A circuit template whose free parameters are bound positionally.
///
/// Parameters are ordered by name; the built-in families name them
/// `θ[000]`, `θ[001]`, … so that name order is construction order.
#[derive(Debug, Clone)]
pub struct Ansatz {
    template: Circuit,
    parameters: Vec<String>,
}

impl Ansatz {
    /// Wrap an arbitrary symbolic circuit.
    pub fn from_circuit(template: Circuit) -> AlgoResult<Self> {
        let parameters = template.parameters()?;
        Ok(Self {
            template,
            parameters,
        })
    }

    /// Build a named family on `num_qubits` qubits.
    pub fn build(kind: AnsatzKind, num_qubits: usize, reps: usize) -> AlgoResult<Self> {
        match kind {
            AnsatzKind::TwoLocal => Self::two_local(num_qubits, reps),
            AnsatzKind::HardwareEfficient => Self::hardware_efficient(num_qubits, reps),
        }
    }

    /// `reps + 1` RY·RZ rotation layers separated by linear CX entanglers.
    pub fn two_local(num_qubits: usize, reps: usize) -> AlgoResult<Self> {
        Self::layered("two_local", num_qubits, reps, Entangler::Cx)
    }

    /// `reps + 1` RY·RZ rotation layers separated by linear CZ entanglers.
    pub fn hardware_efficient(num_qubits: usize, reps: usize) -> AlgoResult<Self> {
        Self::layered("hardware_efficient", num_qubits, reps, Entangler::Cz)
    }

    fn layered(name: &str, num_qubits: usize, reps: usize, entangler: Entangler) -> AlgoResult<Self> {
        if num_qubits == 0 {
            return Err(AlgoError::InvalidInput("ansatz needs at least one qubit".into()));
        }
        let width = u32::try_from(num_qubits)
            .map_err(|_| AlgoError::InvalidInput(format!("{num_qubits} qubits is too many")))?;
        let total = 2 * num_qubits * (reps + 1);
        let digits = (total - 1).to_string().len().max(3);
        let mut next = 0usize;
        let mut param = || {
            let p = ParameterExpression::symbol(format!("θ[{next:0digits$}]"));
            next += 1;
            p
        };

        let mut circuit = Circuit::with_size(name, width, 0);
        for layer in 0..=reps {
            for q in 0..width {
                circuit.ry(param(), QubitId(q))?;
            }
            for q in 0..width {
                circuit.rz(param(), QubitId(q))?;
            }
            if layer < reps {
                for q in 0..width.saturating_sub(1) {
                    match entangler {
                        Entangler::Cx => circuit.cx(QubitId(q), QubitId(q + 1))?,
                        Entangler::Cz => circuit.cz(QubitId(q), QubitId(q + 1))?,
                    };
                }
            }
        }
        Self::from_circuit(circuit)
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.template.num_qubits()
    }

    /// Number of free parameters.
    pub fn num_parameters(&self) -> usize {
        self.parameters.len()
    }

    /// Parameter names in binding order.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// The symbolic template.
    pub fn template(&self) -> &Circuit {
        &self.template
    }

    /// A concrete circuit with `values` bound in [`Ansatz::parameters`] order.
    pub fn bind(&self, values: &[f64]) -> AlgoResult<Circuit> {
        if values.len() != self.parameters.len() {
            return Err(AlgoError::ParameterCountMismatch {
                expected: self.parameters.len(),
                got: values.len(),
            });
        }
        Ok(self.template.bind_parameters(values)?)
    }
}
