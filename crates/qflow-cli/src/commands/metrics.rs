//! Metrics command implementation.

use anyhow::Result;
use console::style;

use qflow_compile::{HardwareModel, analyze};

use super::common::{load_circuit, load_hardware};

/// Execute the metrics command.
pub fn execute(input: &str, target: Option<&str>, json: bool) -> Result<()> {
    let circuit = load_circuit(input)?;
    let hardware = match target {
        Some(target) => load_hardware(target)?,
        None => HardwareModel::default(),
    };
    let metrics = analyze(circuit.num_qubits(), circuit.gates(), &hardware);

    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
        return Ok(());
    }

    println!("{} Metrics for {}", style("→").cyan().bold(), style(input).green());
    println!("  Width:               {}", metrics.circuit_width);
    println!("  Depth:               {}", metrics.circuit_depth);
    println!("  Single-qubit gates:  {}", metrics.single_qubit_gates);
    println!("  Two-qubit gates:     {}", metrics.two_qubit_gates);
    println!("  Multi-qubit gates:   {}", metrics.multi_qubit_gates);
    println!("  Measurements:        {}", metrics.measurement_count);
    println!("  CNOT count:          {}", metrics.cnot_count);
    println!("  T count / depth:     {} / {}", metrics.t_count, metrics.t_depth);
    println!(
        "  Entanglement:        {:.2} ratio, depth {}",
        metrics.entanglement_ratio, metrics.entanglement_depth
    );
    println!("  Quantum volume:      {}", metrics.quantum_volume);
    if let Some(fidelity) = metrics.estimated_fidelity {
        println!(
            "  Estimated fidelity:  {} on {}",
            style(format!("{fidelity:.4}")).green(),
            hardware.name
        );
    }

    let mut counts: Vec<_> = metrics.gate_count.iter().collect();
    counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (name, count) in counts {
        println!("    {:<10} {}", style(name).cyan(), count);
    }

    Ok(())
}
