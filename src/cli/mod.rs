//! CLI command handling
//!
//! Dispatches CLI commands and formats their output.

pub mod demo;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{paths, Error, Result};
use crate::listener::LoggingListener;
use crate::runner::Runner;
use crate::test_case::{Outcome, TestReport};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Demo { name, list } => {
            if list {
                list_demos();
                return Ok(());
            }

            let demos = match name {
                Some(name) => vec![demo::find(&name).ok_or(Error::UnknownDemo(name))?],
                None => demo::all_demos().iter().collect(),
            };
            run_demos(&demos, config).await
        }

        Commands::Config { path } => {
            if path {
                match paths::config_path() {
                    Some(path) => println!("{}", path.display()),
                    None => println!("No configuration directory available"),
                }
                return Ok(());
            }

            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn list_demos() {
    println!("Available demos:");
    for info in demo::all_demos() {
        println!("  {:10} - {}", info.id, info.description);
    }
}

async fn run_demos(demos: &[&demo::DemoInfo], config: &Config) -> Result<()> {
    let runner = Runner::from_config(config).with_listener(LoggingListener);
    let tests = demos.iter().map(|d| (d.build)()).collect();

    let summary = runner.run_all(tests).await?;
    for report in &summary.reports {
        print_report(report);
    }

    let total = summary.reports.len();
    if summary.all_passed() {
        println!(
            "\n{} {}\n",
            "✓".green().bold(),
            format!("{} of {} test cases passed", total, total).green().bold()
        );
        Ok(())
    } else {
        Err(Error::RunFailed {
            failed: summary.failed(),
            total,
        })
    }
}

fn print_report(report: &TestReport) {
    let elapsed = format!("({} ms)", report.duration.as_millis());

    match &report.outcome {
        Outcome::Passed => {
            println!(
                "  {} {} {}",
                "✓".green(),
                report.name.white().bold(),
                elapsed.dimmed()
            );
        }
        outcome => {
            println!(
                "  {} {} {}",
                "✗".red(),
                report.name.white().bold(),
                elapsed.dimmed()
            );
            if let Some(e) = outcome.main_error() {
                println!("      {} {}", "main:".red(), e);
            }
            if let Some(e) = outcome.finally_error() {
                println!("      {} {}", "finally:".red(), e);
            }
        }
    }
}
