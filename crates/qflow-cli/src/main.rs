//! qflow Command-Line Interface
//!
//! Optimize circuits saved by the editor, simulate them, or both.
//!
//! ```text
//!   circuit.json ──> optimize ──> circuit.opt.json
//!        │                              │
//!        └──────────> simulate <────────┘
//!                         │
//!                         v
//!              probabilities / counts
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::optimize::OptimizeArgs;
use commands::simulate::SimulateArgs;
use commands::{metrics, optimize, run, simulate};

/// qflow - quantum circuit optimization and state-vector simulation
#[derive(Parser)]
#[command(name = "qflow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a circuit
    Optimize {
        /// Input circuit (JSON or YAML)
        #[arg(short, long)]
        input: String,

        #[command(flatten)]
        args: OptimizeArgs,

        /// Write the optimized circuit here (JSON or YAML by extension)
        #[arg(short, long)]
        output: Option<String>,

        /// Print the full optimization result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Simulate a circuit and print its measurement distribution
    Simulate {
        /// Input circuit (JSON or YAML)
        #[arg(short, long)]
        input: String,

        #[command(flatten)]
        args: SimulateArgs,
    },

    /// Optimize a circuit, then simulate the result
    Run {
        /// Input circuit (JSON or YAML)
        #[arg(short, long)]
        input: String,

        #[command(flatten)]
        optimize: OptimizeArgs,

        #[command(flatten)]
        simulate: SimulateArgs,
    },

    /// Print circuit metrics
    Metrics {
        /// Input circuit (JSON or YAML)
        #[arg(short, long)]
        input: String,

        /// Hardware target for the fidelity estimate (preset name or model file)
        #[arg(short, long)]
        target: Option<String>,

        /// Print metrics as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Optimize {
            input,
            args,
            output,
            json,
        } => optimize::execute(&input, &args, output.as_deref(), json),

        Commands::Simulate { input, args } => simulate::execute(&input, &args),

        Commands::Run {
            input,
            optimize,
            simulate,
        } => run::execute(&input, optimize, simulate).await,

        Commands::Metrics {
            input,
            target,
            json,
        } => metrics::execute(&input, target.as_deref(), json),
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_optimize_flags() {
        let cli = Cli::try_parse_from([
            "qflow",
            "optimize",
            "-i",
            "c.json",
            "-l",
            "2",
            "--target",
            "ring8",
            "--map",
            "--max-depth",
            "4",
        ])
        .unwrap();
        match cli.command {
            Commands::Optimize { input, args, .. } => {
                assert_eq!(input, "c.json");
                assert_eq!(args.level, Some(2));
                assert_eq!(args.target.as_deref(), Some("ring8"));
                assert!(args.map);
                assert_eq!(args.max_depth, Some(4));
            }
            _ => panic!("expected optimize"),
        }
    }

    #[test]
    fn test_parse_verbosity() {
        let cli = Cli::try_parse_from(["qflow", "-vv", "metrics", "-i", "c.json"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_run_accepts_both_flag_sets() {
        let cli = Cli::try_parse_from([
            "qflow", "run", "-i", "c.json", "-l", "1", "--shots", "100", "--seed", "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                optimize, simulate, ..
            } => {
                assert_eq!(optimize.level, Some(1));
                assert_eq!(simulate.shots, Some(100));
                assert_eq!(simulate.seed, 3);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_missing_input_rejected() {
        assert!(Cli::try_parse_from(["qflow", "simulate"]).is_err());
    }
}
