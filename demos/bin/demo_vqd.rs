//! Variational Quantum Deflation Demo
//!
//! Finds the ground state and the first excited states one at a time. Each
//! search penalizes overlap with every state accepted before it.

use anyhow::Result;
use clap::Parser;
use indicatif::ProgressBar;
use serde_json::json;

use qexcite_algo::{Vqd, classical_solver};
use qexcite_demos::setup::{CommonArgs, build_ansatz, build_executor};
use qexcite_demos::{
    create_progress_bar, init_logging, print_comparison, print_header, print_info, print_result,
    print_section, print_success,
};

#[derive(Parser, Debug)]
#[command(name = "demo-vqd")]
#[command(about = "Find low-lying eigenstates by variational quantum deflation")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Excited states to find on top of the ground state
    #[arg(short, long)]
    excited: Option<usize>,

    /// Overlap penalty weight β
    #[arg(short, long)]
    beta: Option<f64>,

    /// Overlap estimator (swap, dswap, amplitude)
    #[arg(short, long)]
    overlap: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = args.common.load_config()?;
    if let Some(excited) = args.excited {
        config.vqd.n_excited_states = excited;
    }
    if args.beta.is_some() {
        config.vqd.beta = args.beta;
    }
    if let Some(overlap) = &args.overlap {
        config.vqd.overlap.clone_from(overlap);
    }
    config.validate()?;
    init_logging(&config.logging);

    let (model, hamiltonian) = args.common.hamiltonian(&config)?;
    let vqd_config = config.vqd_config()?;
    let exact = classical_solver(&hamiltonian)?;
    let executor = build_executor(&config)?;
    let ansatz = build_ansatz(&config, &hamiltonian)?;
    let optimizer = config.build_optimizer()?;
    let total = vqd_config.n_excited_states + 1;
    let quiet = args.common.json;

    if !quiet {
        print_header("Variational Quantum Deflation Demo");

        print_section("Problem Setup");
        print_result("Hamiltonian", &model);
        print_result("Qubits", hamiltonian.num_qubits());
        print_result("Terms", hamiltonian.num_terms());
        print_result("States sought", total);
        print_result("Ansatz", format!("{} (reps {})", config.ansatz.kind, config.ansatz.reps));
        print_result("Parameters", ansatz.num_parameters());
        print_result("Optimizer", &config.optimizer.method);
        print_result("Overlap", vqd_config.overlap);
        print_result("β", vqd_config.beta);
        print_result("Shots", executor.shots());
        print_result("Energy path", executor.energy_path());

        print_section("Hamiltonian");
        println!("{hamiltonian}");
    }

    let mut vqd = Vqd::new(hamiltonian, ansatz, optimizer, executor, vqd_config)?;

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        print_section("Deflation");
        create_progress_bar(total as u64, "Searching...")
    };
    vqd.run_with_progress(|index, state| {
        pb.inc(1);
        pb.set_message(format!("state {index}: {:.4}", state.energy));
    })?;
    pb.finish_with_message("Deflation complete");

    let found = vqd.energies();
    let reference = exact.lowest(total);

    if quiet {
        let states: Vec<_> = vqd
            .accepted()
            .iter()
            .enumerate()
            .map(|(i, s)| {
                json!({
                    "index": i,
                    "energy": s.energy,
                    "sampled_energy": s.sampled_energy,
                    "exact": reference.get(i),
                    "evaluations": s.evaluations,
                    "params": s.params,
                })
            })
            .collect();
        let report = json!({
            "algorithm": "vqd",
            "hamiltonian": model,
            "overlap": vqd.config().overlap,
            "beta": vqd.config().beta,
            "states": states,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_section("Results");
    print_comparison(&found, reference);
    print_section("Unpenalized energies");
    print_comparison(&vqd.sampled_energies(), reference);
    let evaluations: usize = vqd.accepted().iter().map(|s| s.evaluations).sum();
    print_result("Objective evaluations", evaluations);
    if let Some(gap) = exact.gap() {
        print_result("Exact gap", format!("{gap:.6}"));
    }

    println!();
    print_success("VQD demo complete!");
    print_info("Results include the overlap penalty; unpenalized energies are resampled.");
    Ok(())
}
