//! Exertion simulator CLI
//!
//! Runs scenario files against an in-process grid and prints the outcome of
//! every dispatch.

use anyhow::Context;
use clap::{Parser, Subcommand};
use exertion_simulator::{run_scenario, ScenarioConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "exertion-sim")]
#[command(about = "Dispatch exertion scenarios against an in-process grid")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and print the report
    Run {
        /// Scenario file (TOML)
        #[arg(short, long)]
        scenario: PathBuf,

        /// Exit with a non-zero status if any dispatch did not finish DONE
        #[arg(long)]
        strict: bool,
    },

    /// Parse a scenario file without running it
    Check {
        /// Scenario file (TOML)
        #[arg(short, long)]
        scenario: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { scenario, strict } => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .init();

            let config = ScenarioConfig::load(&scenario)
                .with_context(|| format!("loading {}", scenario.display()))?;
            let report = run_scenario(&config)?;
            println!("{report}");

            let finished = report.count(exertion_types::ExecState::Done);
            if strict && finished != report.results.len() {
                anyhow::bail!(
                    "{} of {} dispatches did not finish",
                    report.results.len() - finished,
                    report.results.len()
                );
            }
        }
        Commands::Check { scenario } => {
            let config = ScenarioConfig::load(&scenario)
                .with_context(|| format!("loading {}", scenario.display()))?;
            println!(
                "{}: {} providers, {} dispatches",
                scenario.display(),
                config.providers.len(),
                config.total_dispatches()
            );
        }
    }

    Ok(())
}
