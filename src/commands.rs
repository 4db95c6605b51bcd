//! CLI command definitions
//!
//! Defines the clap commands for the actionflow CLI.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Run built-in demonstration test cases
    Demo {
        /// Demo to run (default: all)
        name: Option<String>,

        /// List available demos
        #[arg(long)]
        list: bool,
    },

    /// Show the effective configuration
    Config {
        /// Print only the config file location
        #[arg(long)]
        path: bool,
    },
}
