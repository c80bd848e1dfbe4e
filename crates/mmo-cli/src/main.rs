//! mmo-gates - gate policy and eligibility CLI
//!
//! Annotates recommendation reports with gate results and eligibility flags,
//! and inspects policy and profile documents.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mmo_core::errors::{GateError, MmoErrorCode};
use mmo_core::tracing::init_tracing;

mod commands;

/// mmo-gates - gate policy and eligibility engine
#[derive(Parser, Debug)]
#[command(name = "mmo-gates")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Project root; relative paths in `mmo.toml` and the defaults resolve here
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Annotate a report's recommendations with gate results
    Apply(commands::apply::ApplyArgs),

    /// Validate a gate policy and print its gate ids
    CheckPolicy {
        /// Gate policy document (YAML or JSON)
        #[arg(long)]
        policy: Option<PathBuf>,
    },

    /// List the profile ids of an authority profile registry
    ListProfiles {
        /// Authority profile registry (YAML or JSON)
        #[arg(long)]
        profiles: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", render_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Apply(args) => commands::apply::run(&cli.root, &args),
        Commands::CheckPolicy { policy } => commands::inspect::check_policy(&cli.root, policy),
        Commands::ListProfiles { profiles } => commands::inspect::list_profiles(&cli.root, profiles),
    }
}

/// Engine errors print as `[CODE] message` so repeated runs over the same
/// input fail with byte-identical output.
fn render_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<GateError>() {
        Some(gate_error) => gate_error.coded_string(),
        None => format!("{err:#}"),
    }
}
