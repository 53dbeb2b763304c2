mod commands;
mod logging;
mod progress;

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use cleanmeta_core::{AppConfig, BatchReport, ScrubEngine};
use colored::*;
use commands::{Cli, Commands, ProcessArgs};
use dotenv::dotenv;
use progress::CliReporter;
use tracing::error;

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Cli::parse();

    let mut config = cleanmeta_core::config::load_configuration_from(&args.config)
        .with_context(|| format!("loading configuration '{}'", args.config))?;

    match args.command {
        Some(Commands::Process(process_args)) => {
            config.backup |= process_args.backup;
            config.log.enabled |= process_args.log;

            let log_dir: Option<PathBuf> = if config.log.enabled {
                Some(match &config.log.directory {
                    Some(dir) => dir.clone(),
                    None => logging::default_log_dir(&process_args.paths[0]),
                })
            } else {
                None
            };

            let guard = logging::init_logger(log_dir.as_deref());
            let failed = run_process(config, &process_args);
            // flush the file writer before exiting
            drop(guard);

            match failed {
                Ok(false) => {}
                Ok(true) => process::exit(1),
                Err(err) => {
                    eprintln!("Error: {:#}", err);
                    process::exit(1);
                }
            }
        }
        Some(Commands::PrintConfig) => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

/// Returns whether any file failed.
fn run_process(config: AppConfig, args: &ProcessArgs) -> anyhow::Result<bool> {
    let engine = ScrubEngine::new(config);
    let reporter = CliReporter::new();
    let report = engine.run(&args.paths, &reporter)?;

    for outcome in report.outcomes.iter().filter(|o| o.outcome.is_failure()) {
        error!("{}: {}", outcome.source.display(), outcome.outcome);
    }

    print_summary(&report);

    Ok(report.has_failures())
}

/// Coloured run summary on stderr. Kept out of `tracing` so the log file
/// never receives colour codes.
fn print_summary(report: &BatchReport) {
    eprintln!();
    eprintln!(
        "Discovery: {}, Conversion: {}, Stripping: {}",
        format!("{:.2}s", report.discovery_duration.as_secs_f64()).green(),
        format!("{:.2}s", report.conversion_duration.as_secs_f64()).green(),
        format!("{:.2}s", report.strip_duration.as_secs_f64()).green(),
    );
    eprintln!(
        "{} cleaned, {} skipped, {} failed",
        report.succeeded().to_string().green(),
        report.skipped().to_string().yellow(),
        report.failed().to_string().red(),
    );
}
