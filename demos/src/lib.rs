//! qexcite Demo Suite
//!
//! Command-line demonstrations of variational excited-state search on the
//! bundled shot simulator:
//!
//! - **demo-vqd**: variational quantum deflation, one state at a time
//! - **demo-ssvqe**: subspace-search VQE over orthogonal basis inputs
//!
//! Both binaries read a [`qexcite_algo::RunConfig`] (YAML file, `QEXCITE_*`
//! environment, `.env`), apply command-line overrides on top, and compare
//! what they find against exact diagonalization.

pub mod setup;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use qexcite_algo::config::LoggingSettings;

/// Create a progress bar for demo operations.
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .map(|s| s.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when it is set.
pub fn init_logging(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.to_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let installed = if settings.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Print a demo header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    println!("{}", style(format!("  {title}")).cyan().bold());
    println!("{}", style("═".repeat(60)).cyan());
    println!();
}

/// Print a demo section.
pub fn print_section(title: &str) {
    println!();
    println!("{}", style(format!("▶ {title}")).green().bold());
    println!("{}", style("─".repeat(40)).dim());
}

/// Print a result line.
pub fn print_result(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", style(format!("{label}:")).dim(), value);
}

/// Print found energies next to the exact ones.
pub fn print_comparison(found: &[f64], exact: &[f64]) {
    println!(
        "  {:>5}  {:>12}  {:>12}  {:>10}",
        style("state").dim(),
        style("found").dim(),
        style("exact").dim(),
        style("|error|").dim()
    );
    for (i, (f, e)) in found.iter().zip(exact).enumerate() {
        println!("  {i:>5}  {f:>12.6}  {e:>12.6}  {:>10.6}", (f - e).abs());
    }
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("ℹ").blue(), message);
}
