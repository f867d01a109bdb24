//! Run configuration for the variational engines.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with QEXCITE_ prefix)
//! 3. .env files
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use qexcite_hal::BackendConfig;
use qexcite_ir::PauliHamiltonian;

use crate::ansatz::AnsatzKind;
use crate::executor::DEFAULT_SHOTS;
use crate::optimizers::{NelderMead, OptimizerChoice, Spsa};
use crate::overlap::OverlapMethod;
use crate::ssvqe::SsvqeConfig;
use crate::vqd::VqdConfig;

/// Complete run configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Execution backend settings
    #[serde(default)]
    pub backend: BackendSettings,

    /// Ansatz family and depth
    #[serde(default)]
    pub ansatz: AnsatzSettings,

    /// Classical optimizer settings
    #[serde(default)]
    pub optimizer: OptimizerSettings,

    /// Deflation search settings
    #[serde(default)]
    pub vqd: VqdSettings,

    /// Subspace search settings
    #[serde(default)]
    pub ssvqe: SsvqeSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Hamiltonian terms; callers fall back to a built-in model when unset
    #[serde(default)]
    pub hamiltonian: Option<Vec<TermSpec>>,
}

/// Simulator backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Shots per circuit
    #[serde(default = "default_shots")]
    pub shots: u32,

    /// Sampling seed
    #[serde(default)]
    pub seed: Option<u64>,

    /// Largest circuit the simulator accepts
    #[serde(default = "default_max_qubits")]
    pub max_qubits: u32,

    /// Per-bit readout flip probability
    #[serde(default)]
    pub readout_error: f64,

    /// Evaluate energies exactly instead of by sampling
    #[serde(default)]
    pub managed_expectation: bool,
}

/// Ansatz settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnsatzSettings {
    /// "two_local" or "hardware_efficient"
    #[serde(default = "default_ansatz_kind")]
    pub kind: String,

    /// Entangling repetitions
    #[serde(default = "default_reps")]
    pub reps: usize,
}

/// Optimizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerSettings {
    /// "nelder_mead" or "spsa"
    #[serde(default = "default_optimizer_method")]
    pub method: String,

    /// Maximum iterations
    #[serde(default = "default_maxiter")]
    pub maxiter: usize,

    /// Convergence tolerance (nelder_mead)
    #[serde(default = "default_tol")]
    pub tol: f64,

    /// Initial trust radius (nelder_mead) or step size (spsa)
    #[serde(default = "default_step")]
    pub step: f64,
}

/// Deflation search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VqdSettings {
    /// Excited states on top of the ground state
    #[serde(default = "default_n_excited_states")]
    pub n_excited_states: usize,

    /// Overlap penalty weight; required for deflation runs
    #[serde(default)]
    pub beta: Option<f64>,

    /// "swap", "dswap" or "amplitude"
    #[serde(default = "default_overlap")]
    pub overlap: String,

    /// Initial-point seed
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Subspace search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsvqeSettings {
    /// Number of lowest states to capture
    #[serde(default = "default_n_excited")]
    pub n_excited: usize,

    /// Initial-point seed
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// One weighted Pauli label, rightmost character on qubit 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermSpec {
    /// Pauli label such as "ZI"
    pub label: String,
    /// Coefficient
    pub coefficient: f64,
}

fn default_shots() -> u32 {
    DEFAULT_SHOTS
}

fn default_max_qubits() -> u32 {
    20
}

fn default_ansatz_kind() -> String {
    "two_local".to_string()
}

fn default_reps() -> usize {
    1
}

fn default_optimizer_method() -> String {
    "nelder_mead".to_string()
}

fn default_maxiter() -> usize {
    300
}

fn default_tol() -> f64 {
    1e-6
}

fn default_step() -> f64 {
    0.5
}

fn default_n_excited_states() -> usize {
    1
}

fn default_overlap() -> String {
    "swap".to_string()
}

fn default_n_excited() -> usize {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            shots: default_shots(),
            seed: None,
            max_qubits: default_max_qubits(),
            readout_error: 0.0,
            managed_expectation: false,
        }
    }
}

impl Default for AnsatzSettings {
    fn default() -> Self {
        Self {
            kind: default_ansatz_kind(),
            reps: default_reps(),
        }
    }
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            method: default_optimizer_method(),
            maxiter: default_maxiter(),
            tol: default_tol(),
            step: default_step(),
        }
    }
}

impl Default for VqdSettings {
    fn default() -> Self {
        Self {
            n_excited_states: default_n_excited_states(),
            beta: None,
            overlap: default_overlap(),
            seed: None,
        }
    }
}

impl Default for SsvqeSettings {
    fn default() -> Self {
        Self {
            n_excited: default_n_excited(),
            seed: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn parse_into<T: std::str::FromStr>(target: &mut T, value: Option<String>) {
    if let Some(parsed) = value.and_then(|v| v.parse().ok()) {
        *target = parsed;
    }
}

impl RunConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_yaml_str(&contents)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = serde_yaml_ng::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the full precedence chain.
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = if let Some(path) = config_file {
            Self::from_file(path)?
        } else {
            RunConfig::default()
        };

        let config = config.merge_env_with(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `QEXCITE_*` overrides read through `lookup`.
    ///
    /// Only keys that are present override; unparsable numbers are ignored.
    pub fn merge_env_with<L>(mut self, lookup: L) -> Self
    where
        L: Fn(&str) -> Option<String>,
    {
        // Backend
        parse_into(&mut self.backend.shots, lookup("QEXCITE_SHOTS"));
        if let Some(v) = lookup("QEXCITE_SEED").and_then(|v| v.parse().ok()) {
            self.backend.seed = Some(v);
        }
        parse_into(&mut self.backend.max_qubits, lookup("QEXCITE_MAX_QUBITS"));
        parse_into(&mut self.backend.readout_error, lookup("QEXCITE_READOUT_ERROR"));
        parse_into(
            &mut self.backend.managed_expectation,
            lookup("QEXCITE_MANAGED_EXPECTATION"),
        );

        // Ansatz
        if let Some(v) = lookup("QEXCITE_ANSATZ") {
            self.ansatz.kind = v;
        }
        parse_into(&mut self.ansatz.reps, lookup("QEXCITE_REPS"));

        // Optimizer
        if let Some(v) = lookup("QEXCITE_OPTIMIZER") {
            self.optimizer.method = v;
        }
        parse_into(&mut self.optimizer.maxiter, lookup("QEXCITE_MAXITER"));

        // Engines
        parse_into(&mut self.vqd.n_excited_states, lookup("QEXCITE_EXCITED_STATES"));
        if let Some(v) = lookup("QEXCITE_BETA").and_then(|v| v.parse().ok()) {
            self.vqd.beta = Some(v);
        }
        if let Some(v) = lookup("QEXCITE_OVERLAP") {
            self.vqd.overlap = v;
        }
        parse_into(&mut self.ssvqe.n_excited, lookup("QEXCITE_SSVQE_STATES"));

        // Logging
        if let Some(v) = lookup("QEXCITE_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = lookup("QEXCITE_LOG_FORMAT") {
            self.logging.format = v;
        }

        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.shots == 0 {
            return Err(ConfigError::ValidationError(
                "backend.shots must be positive".into(),
            ));
        }
        if !(0.0..=0.5).contains(&self.backend.readout_error) {
            return Err(ConfigError::ValidationError(format!(
                "backend.readout_error must be in [0, 0.5], got {}",
                self.backend.readout_error
            )));
        }

        self.ansatz_kind()?;
        match self.optimizer.method.as_str() {
            "nelder_mead" | "spsa" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown optimizer: {other}"
                )));
            }
        }
        if !(self.optimizer.step.is_finite() && self.optimizer.step > 0.0) {
            return Err(ConfigError::ValidationError(
                "optimizer.step must be positive".into(),
            ));
        }
        self.overlap_method()?;
        if let Some(beta) = self.vqd.beta {
            if !(beta.is_finite() && beta > 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "vqd.beta must be positive, got {beta}"
                )));
            }
        }
        if self.ssvqe.n_excited == 0 {
            return Err(ConfigError::ValidationError(
                "ssvqe.n_excited must be positive".into(),
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {other}"
                )));
            }
        }
        match self.logging.format.as_str() {
            "text" | "json" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {other}"
                )));
            }
        }

        if let Some(terms) = &self.hamiltonian {
            self.build_hamiltonian_from(terms)?;
        }
        Ok(())
    }

    /// The configured ansatz family.
    pub fn ansatz_kind(&self) -> Result<AnsatzKind, ConfigError> {
        self.ansatz
            .kind
            .parse()
            .map_err(|_| ConfigError::ValidationError(format!("Unknown ansatz: {}", self.ansatz.kind)))
    }

    /// The configured overlap protocol.
    pub fn overlap_method(&self) -> Result<OverlapMethod, ConfigError> {
        self.vqd
            .overlap
            .parse()
            .map_err(|_| ConfigError::ValidationError(format!("Unknown overlap method: {}", self.vqd.overlap)))
    }

    /// The configured optimizer.
    pub fn build_optimizer(&self) -> Result<OptimizerChoice, ConfigError> {
        let o = &self.optimizer;
        match o.method.as_str() {
            "nelder_mead" => Ok(NelderMead::new()
                .with_maxiter(o.maxiter)
                .with_tol(o.tol)
                .with_trust_region(o.step, 1e-4)
                .into()),
            "spsa" => {
                let mut spsa = Spsa::new().with_maxiter(o.maxiter).with_step(o.step);
                spsa.seed = self.vqd.seed.or(self.ssvqe.seed);
                Ok(spsa.into())
            }
            other => Err(ConfigError::ValidationError(format!("Unknown optimizer: {other}"))),
        }
    }

    /// Deflation settings; fails when `vqd.beta` is unset.
    pub fn vqd_config(&self) -> Result<VqdConfig, ConfigError> {
        let beta = self.vqd.beta.ok_or_else(|| {
            ConfigError::ValidationError("vqd.beta is required for deflation runs".into())
        })?;
        let mut config =
            VqdConfig::new(self.vqd.n_excited_states, beta).with_overlap(self.overlap_method()?);
        config.seed = self.vqd.seed;
        Ok(config)
    }

    /// Subspace search settings.
    pub fn ssvqe_config(&self) -> SsvqeConfig {
        SsvqeConfig {
            n_excited: self.ssvqe.n_excited,
            seed: self.ssvqe.seed,
        }
    }

    /// Settings for the simulator's [`qexcite_hal::BackendFactory`].
    pub fn backend_config(&self) -> BackendConfig {
        let b = &self.backend;
        let mut config = BackendConfig::new("simulator")
            .with_extra("max_qubits", serde_json::json!(b.max_qubits))
            .with_extra("readout_error", serde_json::json!(b.readout_error))
            .with_extra("managed_expectation", serde_json::json!(b.managed_expectation));
        if let Some(seed) = b.seed {
            config = config.with_extra("seed", serde_json::json!(seed));
        }
        config
    }

    /// The configured Hamiltonian, if terms were given.
    pub fn hamiltonian(&self) -> Result<Option<PauliHamiltonian>, ConfigError> {
        self.hamiltonian
            .as_deref()
            .map(|terms| self.build_hamiltonian_from(terms))
            .transpose()
    }

    fn build_hamiltonian_from(&self, terms: &[TermSpec]) -> Result<PauliHamiltonian, ConfigError> {
        let labels: Vec<(&str, f64)> = terms
            .iter()
            .map(|t| (t.label.as_str(), t.coefficient))
            .collect();
        PauliHamiltonian::from_labels(&labels)
            .map_err(|e| ConfigError::ValidationError(format!("hamiltonian: {e}")))
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.backend.shots, 10_000);
        assert_eq!(config.optimizer.method, "nelder_mead");
        assert_eq!(config.vqd.overlap, "swap");
        assert!(config.vqd.beta.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_round_trip_of_sections() {
        let yaml = r#"
backend:
  shots: 2000
  seed: 7
  managed_expectation: true
vqd:
  n_excited_states: 2
  beta: 3.0
  overlap: dswap
hamiltonian:
  - { label: "ZI", coefficient: 0.5 }
  - { label: "ZZ", coefficient: 0.5 }
"#;
        let config = RunConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.backend.shots, 2000);
        assert_eq!(config.ansatz.reps, 1);

        let vqd = config.vqd_config().unwrap();
        assert_eq!(vqd.n_excited_states, 2);
        assert_eq!(vqd.overlap, OverlapMethod::DestructiveSwap);

        let h = config.hamiltonian().unwrap().unwrap();
        assert_eq!(h.num_qubits(), 2);
        assert_eq!(config.backend_config().extra_u64("seed").unwrap(), Some(7));
    }

    #[test]
    fn test_beta_required_for_vqd() {
        let config = RunConfig::default();
        assert!(matches!(
            config.vqd_config(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_rejections() {
        let mut config = RunConfig::default();
        config.backend.shots = 0;
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.backend.readout_error = 0.7;
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.vqd.overlap = "bell".to_string();
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.optimizer.method = "adam".to_string();
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.vqd.beta = Some(-1.0);
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_hamiltonian_label() {
        let yaml = "hamiltonian:\n  - { label: \"ZQ\", coefficient: 1.0 }\n";
        assert!(matches!(
            RunConfig::from_yaml_str(yaml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("QEXCITE_SHOTS", "123"),
            ("QEXCITE_BETA", "2.5"),
            ("QEXCITE_OVERLAP", "amplitude"),
            ("QEXCITE_REPS", "not-a-number"),
        ]
        .into_iter()
        .collect();
        let config =
            RunConfig::default().merge_env_with(|k| env.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.backend.shots, 123);
        assert_eq!(config.vqd.beta, Some(2.5));
        assert_eq!(config.overlap_method().unwrap(), OverlapMethod::AmplitudeTransition);
        assert_eq!(config.ansatz.reps, 1);
    }

    #[test]
    fn test_build_optimizer() {
        let mut config = RunConfig::default();
        assert!(matches!(
            config.build_optimizer().unwrap(),
            OptimizerChoice::NelderMead(_)
        ));
        config.optimizer.method = "spsa".to_string();
        config.vqd.seed = Some(4);
        match config.build_optimizer().unwrap() {
            OptimizerChoice::Spsa(s) => assert_eq!(s.seed, Some(4)),
            other => panic!("unexpected optimizer {other:?}"),
        }
    }
}
