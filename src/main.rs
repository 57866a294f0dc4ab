mod commands;

use crate::commands::{info, simulate};
use clap::{Parser, Subcommand};
use pact_merge::config::{ScenarioFile, SimulationConfig};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(about = "Simulate merging two electoral pacts under d'Hondt")]
struct Opts {
    /// Log debug output (overridden by RUST_LOG).
    #[clap(long, global = true)]
    verbose: bool,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate result workbooks and dump what was read.
    Info {
        /// Directory of per-district result workbooks.
        inputs: PathBuf,
    },
    /// Compare the official result with two pacts merged into one.
    Simulate {
        /// Directory of per-district result workbooks
        #[clap(long)]
        inputs: Option<PathBuf>,
        /// Code of the first pact to merge (e.g. "C")
        #[clap(long)]
        pact_a: Option<String>,
        /// Code of the second pact to merge (e.g. "J")
        #[clap(long)]
        pact_b: Option<String>,
        /// Only simulate these district ids
        #[clap(long, multiple_values = true)]
        circ: Vec<String>,
        /// Also print districts the merge leaves unchanged
        #[clap(long)]
        print_all: bool,
        /// Write the full report as JSON to this file
        #[clap(long)]
        json: Option<PathBuf>,
        /// JSON scenario file; flags take precedence over it
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let opts = Opts::parse();

    let default_level = if opts.verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match opts.command {
        Command::Info { inputs } => {
            if let Err(e) = info(&inputs) {
                eprintln!("❌ Info failed: {}", e);
                std::process::exit(1);
            }
        }
        Command::Simulate {
            inputs,
            pact_a,
            pact_b,
            circ,
            print_all,
            json,
            config,
        } => {
            let flags = ScenarioFile {
                inputs,
                pact_a,
                pact_b,
                districts: circ,
                print_all,
                json,
            };
            if let Err(e) = run_simulation(config, flags) {
                eprintln!("❌ Simulation failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run_simulation(config: Option<PathBuf>, flags: ScenarioFile) -> commands::Result<()> {
    let settings = match config {
        Some(path) => ScenarioFile::read(&path)?.overridden_by(flags),
        None => flags,
    };
    let config = SimulationConfig::resolve(settings)?;
    simulate(&config)
}
