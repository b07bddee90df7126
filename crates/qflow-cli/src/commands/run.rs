//! Run command implementation: optimize, then simulate.

use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use super::common::load_circuit;
use super::optimize::{OptimizeArgs, optimize_circuit, print_summary};
use super::simulate::{SimulateArgs, simulate_circuit};

/// Execute the run command.
///
/// The work runs on a blocking worker thread while a spinner animates on
/// this one; the worker hands back a single result or error.
pub async fn execute(input: &str, optimize: OptimizeArgs, simulate: SimulateArgs) -> Result<()> {
    let options = optimize.resolve()?;
    let circuit = load_circuit(input)?;

    if !simulate.json {
        println!(
            "{} Running {} ({} qubits, {} gates)",
            style("→").cyan().bold(),
            style(input).green(),
            circuit.num_qubits(),
            circuit.gates().len()
        );
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Optimizing and simulating...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let sim_args = simulate.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let (optimized, rebuilt) = optimize_circuit(&circuit, &options)?;
        let simulated = simulate_circuit(&rebuilt, &sim_args)?;
        Ok::<_, anyhow::Error>((optimized, simulated))
    })
    .await
    .context("Worker thread failed");

    spinner.finish_and_clear();
    let (optimized, simulated) = outcome??;

    if !simulate.json {
        print_summary(&optimized);
    }
    simulate.print(&simulated)
}
