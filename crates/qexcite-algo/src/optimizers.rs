//! Gradient-free classical optimizers for variational loops.
//!
//! Both optimizers only see a scalar objective `f(&[f64]) -> f64`. A NaN
//! returned by the objective is ranked as `+∞`, so an aborted evaluation can
//! never become the incumbent.

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AlgoResult;

/// A minimizer of scalar objectives.
pub trait Optimizer {
    /// Minimize `objective` starting from `initial_point`.
    ///
    /// The number of variables is `initial_point.len()`.
    fn minimize<F>(&self, objective: F, initial_point: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64;
}

/// Result of an optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Optimal parameter values.
    pub optimal_params: Vec<f64>,
    /// Optimal objective value.
    pub optimal_value: f64,
    /// Number of function evaluations.
    pub num_evaluations: usize,
    /// Number of iterations.
    pub num_iterations: usize,
    /// Best objective value after each improving iteration.
    pub history: Vec<f64>,
    /// Whether the optimization converged.
    pub converged: bool,
}

/// Counts calls and maps NaN to `+∞`.
struct Counted<F> {
    objective: F,
    evaluations: usize,
}

impl<F: FnMut(&[f64]) -> f64> Counted<F> {
    fn new(objective: F) -> Self {
        Self {
            objective,
            evaluations: 0,
        }
    }

    fn eval(&mut self, x: &[f64]) -> f64 {
        self.evaluations += 1;
        let v = (self.objective)(x);
        if v.is_nan() { f64::INFINITY } else { v }
    }
}

fn rank(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    order
}

/// Bounded-step Nelder–Mead simplex with a shrinking trust radius.
///
/// Reflections move at most `rho` per coordinate. When the simplex values
/// flatten out (spread below `tol`) or the simplex collapses below `rhoend`,
/// the radius halves and the simplex is rebuilt around the best vertex.
/// The run converges once that happens at `rho == rhoend`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NelderMead {
    /// Maximum number of iterations.
    pub maxiter: usize,
    /// Convergence tolerance on the spread of simplex values.
    pub tol: f64,
    /// Initial trust region radius.
    pub rhobeg: f64,
    /// Final trust region radius.
    pub rhoend: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            maxiter: 500,
            tol: 1e-6,
            rhobeg: 0.5,
            rhoend: 1e-4,
        }
    }
}

impl NelderMead {
    /// Create a new optimizer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum iterations.
    #[must_use]
    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    /// Set convergence tolerance.
    #[must_use]
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set trust region parameters.
    #[must_use]
    pub fn with_trust_region(mut self, rhobeg: f64, rhoend: f64) -> Self {
        self.rhobeg = rhobeg;
        self.rhoend = rhoend.min(rhobeg);
        self
    }

    fn build_simplex<F: FnMut(&[f64]) -> f64>(
        f: &mut Counted<F>,
        base: Vec<f64>,
        f_base: f64,
        rho: f64,
    ) -> (Vec<Vec<f64>>, Vec<f64>) {
        let n = base.len();
        let mut simplex = Vec::with_capacity(n + 1);
        let mut values = Vec::with_capacity(n + 1);
        for i in 0..n {
            let mut point = base.clone();
            point[i] += rho;
            values.push(f.eval(&point));
            simplex.push(point);
        }
        simplex.push(base);
        values.push(f_base);
        (simplex, values)
    }
}

fn max_distance(simplex: &[Vec<f64>], from: usize) -> f64 {
    simplex
        .iter()
        .flat_map(|p| p.iter().zip(&simplex[from]).map(|(a, b)| (a - b).abs()))
        .fold(0.0, f64::max)
}

impl Optimizer for NelderMead {
    fn minimize<F>(&self, objective: F, initial_point: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64,
    {
        let n = initial_point.len();
        let mut f = Counted::new(objective);
        let f0 = f.eval(&initial_point);
        let mut history = vec![f0];

        if n == 0 || self.maxiter == 0 {
            return OptimizationResult {
                optimal_params: initial_point,
                optimal_value: f0,
                num_evaluations: f.evaluations,
                num_iterations: 0,
                history,
                converged: n == 0,
            };
        }

        let mut rho = self.rhobeg;
        let (mut simplex, mut values) = Self::build_simplex(&mut f, initial_point, f0, rho);
        let mut incumbent = f0;
        let mut converged = false;
        let mut iterations = 0;

        while iterations < self.maxiter {
            iterations += 1;
            let order = rank(&values);
            let (best, second_worst, worst) = (order[0], order[n - 1], order[n]);

            let spread = values[worst] - values[best];
            if spread < self.tol || max_distance(&simplex, best) < self.rhoend {
                if rho <= self.rhoend {
                    converged = true;
                    break;
                }
                rho = (rho * 0.5).max(self.rhoend);
                let base = simplex[best].clone();
                let f_base = values[best];
                (simplex, values) = Self::build_simplex(&mut f, base, f_base, rho);
                continue;
            }

            let mut centroid = vec![0.0; n];
            for &idx in &order[..n] {
                for (c, x) in centroid.iter_mut().zip(&simplex[idx]) {
                    *c += x;
                }
            }
            for c in &mut centroid {
                *c /= n as f64;
            }

            let reflected: Vec<f64> = centroid
                .iter()
                .zip(&simplex[worst])
                .map(|(c, w)| {
                    let step = (c - w).clamp(-rho, rho);
                    c + step
                })
                .collect();
            let f_reflected = f.eval(&reflected);

            if f_reflected < values[best] {
                let expanded: Vec<f64> = centroid
                    .iter()
                    .zip(&reflected)
                    .map(|(c, r)| c + 2.0 * (r - c))
                    .collect();
                let f_expanded = f.eval(&expanded);
                if f_expanded < f_reflected {
                    simplex[worst] = expanded;
                    values[worst] = f_expanded;
                } else {
                    simplex[worst] = reflected;
                    values[worst] = f_reflected;
                }
            } else if f_reflected < values[second_worst] {
                simplex[worst] = reflected;
                values[worst] = f_reflected;
            } else {
                let contracted: Vec<f64> = centroid
                    .iter()
                    .zip(&simplex[worst])
                    .map(|(c, w)| 0.5 * (c + w))
                    .collect();
                let f_contracted = f.eval(&contracted);
                if f_contracted < values[worst] {
                    simplex[worst] = contracted;
                    values[worst] = f_contracted;
                } else {
                    let anchor = simplex[best].clone();
                    for i in (0..=n).filter(|&i| i != best) {
                        for (x, a) in simplex[i].iter_mut().zip(&anchor) {
                            *x = 0.5 * (a + *x);
                        }
                        values[i] = f.eval(&simplex[i]);
                    }
                }
            }

            let round_best = values.iter().copied().fold(f64::INFINITY, f64::min);
            if round_best < incumbent {
                incumbent = round_best;
                history.push(incumbent);
            }
        }

        let best = rank(&values)[0];
        debug!(
            evaluations = f.evaluations,
            iterations,
            converged,
            value = values[best],
            "nelder-mead finished"
        );
        OptimizationResult {
            optimal_params: simplex.swap_remove(best),
            optimal_value: values[best],
            num_evaluations: f.evaluations,
            num_iterations: iterations,
            history,
            converged,
        }
    }
}

/// Simultaneous perturbation stochastic approximation.
///
/// Each iteration estimates the gradient from two evaluations along a random
/// ±1 direction. The best evaluated point is returned, not the last iterate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spsa {
    /// Maximum number of iterations.
    pub maxiter: usize,
    /// Initial step size.
    pub a: f64,
    /// Perturbation size.
    pub c: f64,
    /// Step size decay exponent.
    pub alpha: f64,
    /// Perturbation decay exponent.
    pub gamma: f64,
    /// Seed for the perturbation directions; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for Spsa {
    fn default() -> Self {
        Self {
            maxiter: 200,
            a: 0.2,
            c: 0.1,
            alpha: 0.602,
            gamma: 0.101,
            seed: None,
        }
    }
}

impl Spsa {
    /// Create a new SPSA optimizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum iterations.
    #[must_use]
    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    /// Set the initial step size.
    #[must_use]
    pub fn with_step(mut self, a: f64) -> Self {
        self.a = a;
        self
    }

    /// Fix the perturbation seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Optimizer for Spsa {
    fn minimize<F>(&self, objective: F, initial_point: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64,
    {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut f = Counted::new(objective);
        let mut x = initial_point;
        let mut best_x = x.clone();
        let mut best_f = f.eval(&x);
        let mut history = vec![best_f];

        for k in 0..self.maxiter {
            let a_k = self.a / ((k + 1) as f64).powf(self.alpha);
            let c_k = self.c / ((k + 1) as f64).powf(self.gamma);

            let delta: Vec<f64> = (0..x.len())
                .map(|_| if rng.gen_bool(0.5) { 1.0 } else { -1.0 })
                .collect();
            let x_plus: Vec<f64> = x.iter().zip(&delta).map(|(xi, di)| xi + c_k * di).collect();
            let x_minus: Vec<f64> = x.iter().zip(&delta).map(|(xi, di)| xi - c_k * di).collect();
            let diff = f.eval(&x_plus) - f.eval(&x_minus);
            if !diff.is_finite() {
                continue;
            }

            for (xi, di) in x.iter_mut().zip(&delta) {
                *xi -= a_k * diff / (2.0 * c_k * di);
            }

            let f_x = f.eval(&x);
            if f_x.total_cmp(&best_f) == Ordering::Less {
                best_f = f_x;
                best_x.clone_from(&x);
                history.push(best_f);
            }
        }

        debug!(evaluations = f.evaluations, value = best_f, "spsa finished");
        OptimizationResult {
            optimal_params: best_x,
            optimal_value: best_f,
            num_evaluations: f.evaluations,
            num_iterations: self.maxiter,
            history,
            converged: true,
        }
    }
}

/// A runtime-selected optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OptimizerChoice {
    /// Bounded simplex search.
    NelderMead(NelderMead),
    /// Stochastic perturbation gradient descent.
    Spsa(Spsa),
}

impl Optimizer for OptimizerChoice {
    fn minimize<F>(&self, objective: F, initial_point: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64,
    {
        match self {
            OptimizerChoice::NelderMead(o) => o.minimize(objective, initial_point),
            OptimizerChoice::Spsa(o) => o.minimize(objective, initial_point),
        }
    }
}

impl From<NelderMead> for OptimizerChoice {
    fn from(o: NelderMead) -> Self {
        OptimizerChoice::NelderMead(o)
    }
}

impl From<Spsa> for OptimizerChoice {
    fn from(o: Spsa) -> Self {
        OptimizerChoice::Spsa(o)
    }
}

/// Run `optimizer` over an objective that may fail.
///
/// The first error stops further evaluation (later calls see `+∞`) and is
/// returned once the optimizer hands control back.
pub(crate) fn minimize_fallible<O, F>(
    optimizer: &O,
    mut objective: F,
    initial_point: Vec<f64>,
) -> AlgoResult<OptimizationResult>
where
    O: Optimizer,
    F: FnMut(&[f64]) -> AlgoResult<f64>,
{
    let mut failure = None;
    let result = optimizer.minimize(
        |params| {
            if failure.is_some() {
                return f64::INFINITY;
            }
            match objective(params) {
                Ok(v) => v,
                Err(e) => {
                    failure = Some(e);
                    f64::INFINITY
                }
            }
        },
        initial_point,
    );
    match failure {
        Some(e) => Err(e),
        None => Ok(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlgoError;

    fn shifted_bowl(params: &[f64]) -> f64 {
        (params[0] - 1.0).powi(2) + (params[1] - 2.0).powi(2)
    }

    #[test]
    fn test_nelder_mead_quadratic() {
        let result = NelderMead::new().with_maxiter(400).minimize(shifted_bowl, vec![0.0, 0.0]);

        assert!(result.optimal_value < 1e-3);
        assert!((result.optimal_params[0] - 1.0).abs() < 0.05);
        assert!((result.optimal_params[1] - 2.0).abs() < 0.05);
        assert!(result.num_evaluations > result.num_iterations);
    }

    #[test]
    fn test_nelder_mead_rosenbrock() {
        let result = NelderMead::new().with_maxiter(1000).minimize(
            |p| (1.0 - p[0]).powi(2) + 100.0 * (p[1] - p[0].powi(2)).powi(2),
            vec![0.0, 0.0],
        );
        // Starts at 1.0; the curved valley only needs to be entered.
        assert!(result.optimal_value < 0.5);
    }

    #[test]
    fn test_nelder_mead_history_is_monotone() {
        let result = NelderMead::new().minimize(shifted_bowl, vec![3.0, -3.0]);
        assert!(result.history.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn test_nelder_mead_ranks_nan_last() {
        let result = NelderMead::new().with_maxiter(300).minimize(
            |p| if p[0] < 0.0 { f64::NAN } else { (p[0] - 0.5).powi(2) },
            vec![0.2],
        );
        assert!(result.optimal_value.is_finite());
        assert!((result.optimal_params[0] - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_nelder_mead_empty_point() {
        let result = NelderMead::new().minimize(|_| 4.0, vec![]);
        assert_eq!(result.optimal_value, 4.0);
        assert_eq!(result.num_evaluations, 1);
    }

    #[test]
    fn test_spsa_simple() {
        let result = Spsa::new()
            .with_seed(7)
            .with_maxiter(300)
            .minimize(|p| p[0].powi(2) + p[1].powi(2), vec![1.0, 1.0]);
        assert!(result.optimal_value < 0.05);
    }

    #[test]
    fn test_spsa_seed_is_reproducible() {
        let spsa = Spsa::new().with_seed(11).with_maxiter(50);
        let a = spsa.minimize(shifted_bowl, vec![0.0, 0.0]);
        let b = spsa.minimize(shifted_bowl, vec![0.0, 0.0]);
        assert_eq!(a.optimal_params, b.optimal_params);
    }

    #[test]
    fn test_choice_dispatches() {
        let choice: OptimizerChoice = NelderMead::new().into();
        let result = choice.minimize(shifted_bowl, vec![0.0, 0.0]);
        assert!(result.optimal_value < 1e-2);
    }

    #[test]
    fn test_fallible_objective_propagates_first_error() {
        let mut calls = 0;
        let err = minimize_fallible(
            &NelderMead::new(),
            |_| {
                calls += 1;
                if calls == 3 {
                    Err(AlgoError::Computation("boom".into()))
                } else {
                    Ok(1.0)
                }
            },
            vec![0.0, 0.0],
        )
        .unwrap_err();

        assert!(matches!(err, AlgoError::Computation(ref m) if m == "boom"));
        assert_eq!(calls, 3);
    }
}
