//! actionflow CLI
//!
//! Runs the built-in demonstration test cases and inspects configuration.

use std::path::PathBuf;

use actionflow::common::{config::Config, logging};
use actionflow::{cli, commands::Commands};
use clap::Parser;

#[derive(Parser)]
#[command(name = "actionflow", about = "Action-tree integration test engine")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let (guard, log_file) = logging::init(&config.logging);
    if let Some(path) = log_file {
        tracing::debug!(path = %path.display(), "Logging to file");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.runtime.worker_threads())
        .enable_all()
        .build();
    let result = match runtime {
        Ok(runtime) => runtime.block_on(cli::dispatch(cli.command, &config)),
        Err(e) => Err(e.into()),
    };

    // Flush the file writer before a possible exit
    drop(guard);

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
