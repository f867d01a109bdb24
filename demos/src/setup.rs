//! Command-line options shared by the demo binaries.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;

use qexcite_adapter_sim::SimulatorBackend;
use qexcite_algo::hamiltonians::{bcs_hamiltonian, two_qubit_toy};
use qexcite_algo::{Ansatz, Executor, RunConfig};
use qexcite_hal::BackendFactory;
use qexcite_ir::PauliHamiltonian;

/// BCS pairing strength used by the built-in `bcs` model.
const BCS_PAIRING: f64 = 2.0;

/// Options common to every demo.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// YAML run configuration
    #[arg(short, long, env = "QEXCITE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Built-in model used when the configuration lists no terms (toy, bcs)
    #[arg(long, default_value = "toy")]
    pub hamiltonian: String,

    /// Pair levels of the BCS model
    #[arg(long, default_value = "2")]
    pub levels: usize,

    /// Shots per circuit
    #[arg(short, long)]
    pub shots: Option<u32>,

    /// Entangling repetitions of the ansatz
    #[arg(short, long)]
    pub reps: Option<usize>,

    /// Maximum optimizer iterations
    #[arg(short, long)]
    pub maxiter: Option<usize>,

    /// Seed for sampling and initial points
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print results as JSON instead of a report
    #[arg(long)]
    pub json: bool,
}

impl CommonArgs {
    /// Load the run configuration and apply the overrides given here.
    pub fn load_config(&self) -> Result<RunConfig> {
        let path = match &self.config {
            Some(p) => Some(
                p.to_str()
                    .with_context(|| format!("config path {} is not UTF-8", p.display()))?,
            ),
            None => None,
        };
        let mut config = RunConfig::load(path).context("loading run configuration")?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Write the command-line overrides into `config`.
    pub fn apply(&self, config: &mut RunConfig) {
        if let Some(shots) = self.shots {
            config.backend.shots = shots;
        }
        if let Some(reps) = self.reps {
            config.ansatz.reps = reps;
        }
        if let Some(maxiter) = self.maxiter {
            config.optimizer.maxiter = maxiter;
        }
        if let Some(seed) = self.seed {
            config.backend.seed = Some(seed);
            config.vqd.seed = Some(seed);
            config.ssvqe.seed = Some(seed);
        }
    }

    /// The Hamiltonian to solve and a display name for it.
    pub fn hamiltonian(&self, config: &RunConfig) -> Result<(String, PauliHamiltonian)> {
        if let Some(h) = config.hamiltonian()? {
            return Ok(("configured".to_string(), h));
        }
        match self.hamiltonian.to_lowercase().as_str() {
            "toy" => Ok(("½·ZI + ½·ZZ".to_string(), two_qubit_toy()?)),
            "bcs" => {
                if self.levels == 0 {
                    bail!("the BCS model needs at least one level");
                }
                let epsilons = vec![1.0; self.levels];
                Ok((
                    format!("BCS pairing, {} levels", self.levels),
                    bcs_hamiltonian(&epsilons, BCS_PAIRING)?,
                ))
            }
            other => bail!("Unknown Hamiltonian: {other}. Available: toy, bcs"),
        }
    }
}

/// Simulator-backed executor described by `config.backend`.
pub fn build_executor(config: &RunConfig) -> Result<Executor> {
    let backend = SimulatorBackend::from_config(config.backend_config())
        .context("configuring simulator")?;
    Ok(Executor::new(Arc::new(backend), config.backend.shots)?)
}

/// Ansatz of the configured family sized for `hamiltonian`.
pub fn build_ansatz(config: &RunConfig, hamiltonian: &PauliHamiltonian) -> Result<Ansatz> {
    Ok(Ansatz::build(
        config.ansatz_kind()?,
        hamiltonian.num_qubits(),
        config.ansatz.reps,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        common: CommonArgs,
    }

    #[test]
    fn test_overrides_apply_to_every_section() {
        let cli = Cli::parse_from(["demo", "--shots", "512", "--seed", "9", "-r", "3"]);
        let mut config = RunConfig::default();
        cli.common.apply(&mut config);

        assert_eq!(config.backend.shots, 512);
        assert_eq!(config.ansatz.reps, 3);
        assert_eq!(config.backend.seed, Some(9));
        assert_eq!(config.vqd.seed, Some(9));
        assert_eq!(config.ssvqe.seed, Some(9));
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let cli = Cli::parse_from(["demo", "--hamiltonian", "h2"]);
        assert!(cli.common.hamiltonian(&RunConfig::default()).is_err());
    }
}
