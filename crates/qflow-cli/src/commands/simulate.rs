//! Simulate command implementation.

use anyhow::{Context, Result};
use clap::Args;
use console::style;

use qflow_ir::Circuit;
use qflow_sim::{SimulationReport, SimulationResult, Simulator, SimulatorConfig};

use super::common::{load_circuit, print_distribution};

/// Flags controlling simulation and its output.
#[derive(Args, Debug, Clone, Default)]
pub struct SimulateArgs {
    /// Sample this many shots instead of printing exact probabilities
    #[arg(short, long)]
    pub shots: Option<u64>,

    /// Seed for shot sampling
    #[arg(long, default_value = "0")]
    pub seed: u64,

    /// Hide outcomes at or below this probability
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Refuse circuits containing gates that cannot be simulated
    #[arg(long)]
    pub strict: bool,

    /// Largest number of qubits to simulate
    #[arg(long)]
    pub max_qubits: Option<usize>,

    /// Print a JSON report instead of a chart
    #[arg(long)]
    pub json: bool,

    /// Include amplitudes in the JSON report
    #[arg(long)]
    pub amplitudes: bool,
}

impl SimulateArgs {
    /// Simulator settings implied by the flags.
    pub fn config(&self) -> SimulatorConfig {
        let mut config = SimulatorConfig::default();
        if let Some(threshold) = self.threshold {
            config.probability_threshold = threshold;
        }
        if let Some(max) = self.max_qubits {
            config.max_qubits = max;
        }
        config.strict = self.strict;
        config
    }

    /// The JSON report for `result`, with counts when shots were requested.
    pub fn report(&self, result: &SimulationResult) -> SimulationReport {
        let mut report = result.report(self.amplitudes);
        report.counts = self.shots.map(|shots| result.sample_counts(shots, self.seed));
        report
    }

    /// Print `result` in the requested form.
    pub fn print(&self, result: &SimulationResult) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&self.report(result))?);
            return Ok(());
        }

        let wires: Vec<String> = result.wires.iter().map(ToString::to_string).collect();
        println!("  Bit order: {}", wires.join(" "));
        if result.skipped_gates > 0 {
            println!(
                "  {} {} gate(s) could not be simulated and were skipped",
                style("!").yellow().bold(),
                result.skipped_gates
            );
        }

        match self.shots {
            Some(shots) => {
                let counts = result.sample_counts(shots, self.seed);
                let total = shots.max(1) as f64;
                print_distribution(
                    &format!("Counts ({shots} shots)"),
                    counts
                        .iter()
                        .map(|(k, &c)| (k, c as f64 / total, Some(c))),
                );
            }
            None => {
                let probabilities = result.probability_map();
                print_distribution(
                    "Probabilities",
                    probabilities.iter().map(|(k, &p)| (k, p, None)),
                );
            }
        }
        Ok(())
    }
}

/// Simulate a circuit with the settings from `args`.
pub fn simulate_circuit(circuit: &Circuit, args: &SimulateArgs) -> Result<SimulationResult> {
    Simulator::with_config(args.config())
        .run(circuit)
        .context("Simulation failed")
}

/// Execute the simulate command.
pub fn execute(input: &str, args: &SimulateArgs) -> Result<()> {
    let circuit = load_circuit(input)?;

    if !args.json {
        println!(
            "{} Simulating {} ({} qubits, {} gates)",
            style("→").cyan().bold(),
            style(input).green(),
            circuit.num_qubits(),
            circuit.gates().len()
        );
    }

    let result = simulate_circuit(&circuit, args)?;
    args.print(&result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_flags() {
        let args = SimulateArgs {
            threshold: Some(0.1),
            max_qubits: Some(8),
            strict: true,
            ..SimulateArgs::default()
        };
        let config = args.config();
        assert_eq!(config.probability_threshold, 0.1);
        assert_eq!(config.max_qubits, 8);
        assert!(config.strict);
    }

    #[test]
    fn test_report_includes_counts_when_sampling() {
        let args = SimulateArgs {
            shots: Some(50),
            seed: 9,
            ..SimulateArgs::default()
        };
        let result = simulate_circuit(&Circuit::bell().unwrap(), &args).unwrap();
        let report = args.report(&result);
        let counts = report.counts.unwrap();
        assert_eq!(counts.values().sum::<u64>(), 50);
        assert!(report.amplitudes.is_none());
    }

    #[test]
    fn test_capacity_error_has_context() {
        let args = SimulateArgs {
            max_qubits: Some(1),
            ..SimulateArgs::default()
        };
        let err = simulate_circuit(&Circuit::bell().unwrap(), &args).unwrap_err();
        assert!(format!("{err:#}").contains("exceeds the limit"));
    }
}
