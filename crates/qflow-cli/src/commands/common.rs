//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;
use serde::de::DeserializeOwned;

use qflow_compile::{HardwareModel, OptimizationOptions};
use qflow_ir::Circuit;

/// Serialized formats understood by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Pick a format from the file extension; JSON unless it says YAML.
    pub fn from_path(path: &str) -> Self {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Format::Yaml,
            _ => Format::Json,
        }
    }
}

/// Read and deserialize a JSON or YAML document.
pub fn load_document<T: DeserializeOwned>(path: &str) -> Result<T> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }

    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;

    match Format::from_path(path) {
        Format::Yaml => {
            serde_yaml_ng::from_str(&source).with_context(|| format!("Invalid YAML in {path}"))
        }
        Format::Json => {
            serde_json::from_str(&source).with_context(|| format!("Invalid JSON in {path}"))
        }
    }
}

/// Serialize a value and write it as JSON or YAML.
pub fn save_document<T: Serialize>(value: &T, path: &str) -> Result<()> {
    let content = match Format::from_path(path) {
        Format::Yaml => serde_yaml_ng::to_string(value).context("Failed to encode YAML")?,
        Format::Json => serde_json::to_string_pretty(value).context("Failed to encode JSON")?,
    };
    fs::write(path, content).with_context(|| format!("Failed to write file: {path}"))?;
    Ok(())
}

/// Load a circuit saved by the editor.
pub fn load_circuit(path: &str) -> Result<Circuit> {
    let circuit: Circuit = load_document(path)?;
    tracing::info!(
        "Loaded {} qubits, {} gates from {}",
        circuit.num_qubits(),
        circuit.gates().len(),
        path
    );
    Ok(circuit)
}

/// Load optimization options.
pub fn load_options(path: &str) -> Result<OptimizationOptions> {
    load_document(path).with_context(|| format!("Failed to load options from {path}"))
}

/// Resolve a hardware target: a preset name, else a model file.
pub fn load_hardware(target: &str) -> Result<HardwareModel> {
    if let Some(model) = HardwareModel::preset(target) {
        return Ok(model);
    }
    if Path::new(target).exists() {
        return load_document(target)
            .with_context(|| format!("Failed to load hardware model from {target}"));
    }
    anyhow::bail!(
        "Unknown target: '{target}'. Use linearN, ringN, gridRxC, fullN or a hardware model file"
    )
}

/// Print a bitstring distribution as a bar chart.
pub fn print_distribution<'a>(
    title: &str,
    entries: impl IntoIterator<Item = (&'a String, f64, Option<u64>)>,
) {
    println!("\n{} {}:", style("✓").green().bold(), title);

    let mut rows: Vec<_> = entries.into_iter().collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    for (bitstring, prob, count) in rows.iter().take(16) {
        let pct = prob * 100.0;
        let bar: String = "█".repeat((pct / 2.0).round() as usize);
        match count {
            Some(count) => println!(
                "  {}: {:>6} ({:>5.2}%) {}",
                style(bitstring).cyan(),
                count,
                pct,
                style(bar).green()
            ),
            None => println!(
                "  {}: {:>6.4} ({:>5.2}%) {}",
                style(bitstring).cyan(),
                prob,
                pct,
                style(bar).green()
            ),
        }
    }

    if rows.len() > 16 {
        println!("  ... and {} more outcomes", rows.len() - 16);
    }
}
