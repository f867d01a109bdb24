//! Subspace-Search VQE Demo
//!
//! Trains one shared unitary on orthogonal basis inputs so that its outputs
//! land on the lowest eigenstates, ordered by a weighted cost.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use indicatif::ProgressBar;
use serde_json::json;

use qexcite_algo::{Ssvqe, classical_solver};
use qexcite_demos::setup::{CommonArgs, build_ansatz, build_executor};
use qexcite_demos::{
    init_logging, print_comparison, print_header, print_result, print_section, print_success,
};

#[derive(Parser, Debug)]
#[command(name = "demo-ssvqe")]
#[command(about = "Find low-lying eigenstates by subspace-search VQE")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Number of lowest states to capture
    #[arg(short, long)]
    excited: Option<usize>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = args.common.load_config()?;
    if let Some(excited) = args.excited {
        config.ssvqe.n_excited = excited;
    }
    config.validate()?;
    init_logging(&config.logging);

    let (model, hamiltonian) = args.common.hamiltonian(&config)?;
    let ssvqe_config = config.ssvqe_config();
    let exact = classical_solver(&hamiltonian)?;
    let executor = build_executor(&config)?;
    let ansatz = build_ansatz(&config, &hamiltonian)?;
    let optimizer = config.build_optimizer()?;
    let quiet = args.common.json;

    if !quiet {
        print_header("Subspace-Search VQE Demo");

        print_section("Problem Setup");
        print_result("Hamiltonian", &model);
        print_result("Qubits", hamiltonian.num_qubits());
        print_result("States sought", ssvqe_config.n_excited);
        print_result("Ansatz", format!("{} (reps {})", config.ansatz.kind, config.ansatz.reps));
        print_result("Parameters", ansatz.num_parameters());
        print_result("Optimizer", &config.optimizer.method);
        print_result("Shots", executor.shots());
        print_section("Training");
    }

    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        let s = ProgressBar::new_spinner();
        s.set_message("Training shared unitary...");
        s.enable_steady_tick(Duration::from_millis(120));
        s
    };
    let ssvqe = Ssvqe::new(hamiltonian, ansatz, optimizer, executor, ssvqe_config)?;
    spinner.finish_with_message("Training complete");

    let mut found = Vec::with_capacity(ssvqe.n_excited());
    for index in 0..ssvqe.n_excited() {
        let (energy, _) = ssvqe.run(index)?;
        found.push(energy);
    }
    let reference = exact.lowest(ssvqe.n_excited());

    if quiet {
        let report = json!({
            "algorithm": "ssvqe",
            "hamiltonian": model,
            "weights": ssvqe.weights(),
            "weighted_cost": ssvqe.optimization().optimal_value,
            "evaluations": ssvqe.optimization().num_evaluations,
            "energies": found,
            "exact": reference,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_section("Results");
    print_comparison(&found, reference);
    print_result("Weighted cost", format!("{:.6}", ssvqe.optimization().optimal_value));
    print_result("Objective evaluations", ssvqe.optimization().num_evaluations);
    print_result(
        "Converged",
        if ssvqe.optimization().converged { "Yes" } else { "No" },
    );

    println!();
    print_success("SSVQE demo complete!");
    Ok(())
}
