//! Optimize command implementation.

use anyhow::{Context, Result};
use clap::Args;
use console::style;

use qflow_compile::{OptimizationOptions, OptimizationResult, optimize};
use qflow_ir::Circuit;

use super::common::{load_circuit, load_hardware, load_options, save_document};

/// Flags selecting the optimization stages.
///
/// Command-line flags override values from `--options`.
#[derive(Args, Debug, Clone, Default)]
pub struct OptimizeArgs {
    /// Options file (JSON or YAML, camelCase keys)
    #[arg(long)]
    pub options: Option<String>,

    /// Hardware target: linearN, ringN, gridRxC, fullN or a model file
    #[arg(short, long)]
    pub target: Option<String>,

    /// Gate synthesis level (0-3)
    #[arg(short, long)]
    pub level: Option<u8>,

    /// Enable noise-aware CNOT reduction
    #[arg(long)]
    pub noise_aware: bool,

    /// Map logical qubits onto the hardware target
    #[arg(long)]
    pub map: bool,

    /// Keep the identity layout when it already fits
    #[arg(long)]
    pub preserve_layout: bool,

    /// Reschedule gates to their earliest column
    #[arg(long)]
    pub depth: bool,

    /// Compress the schedule into at most this many columns (implies --depth)
    #[arg(long)]
    pub max_depth: Option<u32>,
}

impl OptimizeArgs {
    /// Merge the options file and the flags into one option set.
    pub fn resolve(&self) -> Result<OptimizationOptions> {
        let mut options = match &self.options {
            Some(path) => load_options(path)?,
            None => OptimizationOptions::none(),
        };

        if let Some(level) = self.level {
            options.synthesis_level = level;
        }
        if self.noise_aware {
            options.noise_aware = true;
        }
        if let Some(target) = &self.target {
            options.hardware_model = load_hardware(target)?;
        }
        if self.map {
            options.qubit_mapping = true;
        }
        if self.preserve_layout {
            options.preserve_layout = true;
        }
        if self.depth || self.max_depth.is_some() {
            options.depth_reduction = true;
        }
        if self.max_depth.is_some() {
            options.max_depth = self.max_depth;
        }

        if options.qubit_mapping && options.hardware_model.is_empty() {
            anyhow::bail!("Qubit mapping needs a hardware model: pass --target or set hardwareModel");
        }
        options
            .validate()
            .context("Invalid optimization options")?;
        Ok(options)
    }
}

/// Print the before/after summary of an optimization run.
pub fn print_summary(result: &OptimizationResult) {
    let before = &result.metrics_before;
    let after = &result.metrics_after;

    println!("{} Optimization complete", style("✓").green().bold());
    println!(
        "  Gates: {} -> {}",
        before.gate_count.values().sum::<usize>(),
        style(after.gate_count.values().sum::<usize>()).green()
    );
    println!(
        "  Depth: {} -> {}",
        before.circuit_depth,
        style(after.circuit_depth).green()
    );
    println!(
        "  CNOTs: {} -> {}",
        before.cnot_count,
        style(after.cnot_count).green()
    );
    if let (Some(b), Some(a)) = (before.estimated_fidelity, after.estimated_fidelity) {
        println!("  Estimated fidelity: {b:.4} -> {}", style(format!("{a:.4}")).green());
    }

    for report in &result.reports {
        match &report.skipped {
            Some(reason) => println!(
                "  {} {} skipped: {}",
                style("!").yellow().bold(),
                report.pass,
                reason
            ),
            None => println!(
                "  {} {}: {} -> {} gates",
                style("·").dim(),
                report.pass,
                report.gates_before,
                report.gates_after
            ),
        }
    }

    if let Some(stats) = &result.synthesis {
        println!(
            "  Synthesis: {} cancelled, {} merged, {} collapsed in {} pass(es)",
            stats.cancellations, stats.merges, stats.identities, stats.passes
        );
    }

    if let Some(layout) = &result.layout {
        let pairs: Vec<String> = layout.iter().map(|(l, p)| format!("{l}->{p}")).collect();
        println!("  Layout: {}", pairs.join(", "));
    }
}

/// Optimize `circuit`, returning the result and the rebuilt circuit.
pub fn optimize_circuit(
    circuit: &Circuit,
    options: &OptimizationOptions,
) -> Result<(OptimizationResult, Circuit)> {
    let result = optimize(circuit, options).context("Optimization failed")?;
    let optimized = result.to_circuit(circuit);
    Ok((result, optimized))
}

/// Execute the optimize command.
pub fn execute(input: &str, args: &OptimizeArgs, output: Option<&str>, json: bool) -> Result<()> {
    let options = args.resolve()?;
    let circuit = load_circuit(input)?;

    if !json {
        println!(
            "{} Optimizing {} ({} qubits, {} gates, depth {})",
            style("→").cyan().bold(),
            style(input).green(),
            circuit.num_qubits(),
            circuit.gates().len(),
            circuit.depth()
        );
    }

    let (result, optimized) = optimize_circuit(&circuit, &options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    if let Some(path) = output {
        save_document(&optimized, path)?;
        if !json {
            println!("  Output: {}", style(path).green());
        }
    }

    Ok(())
}
