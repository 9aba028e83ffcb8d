//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments and installs the tracing subscriber
//! - Builds CliArgs and discovers Config
//! - Creates the tokio runtime
//! - Dispatches to command handlers
//! - Handles all error output

use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;

use crate::{CliArgs, Config, ExitCode, LoreError};
use lorewright_utils::error::ConfigError;
use lorewright_utils::logging::init_tracing;

/// Main CLI execution function.
///
/// Prints all output including errors and returns the exit code on failure.
/// main.rs only calls `std::process::exit(code.as_i32())`.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose, cli.log_format.into()) {
        eprintln!("⚠ Could not initialize logging: {e}");
    }

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        model: cli.model.clone(),
        state_dir: cli.state_dir.clone(),
        data_dir: cli.data_dir.clone(),
        max_attempts: cli.max_attempts,
        verbose: Some(cli.verbose),
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            match err.downcast::<ConfigError>() {
                Ok(config_error) => {
                    eprintln!("{}", LoreError::Config(config_error).display_for_user());
                }
                Err(other) => eprintln!("✗ Configuration could not be loaded: {other:#}"),
            }
            return Err(ExitCode::CLI_ARGS);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let result = rt.block_on(async {
        match cli.command {
            Commands::Generate {
                project,
                counts,
                stop_after,
                fresh,
                json,
            } => {
                let counts = counts.apply(config.counts);
                commands::execute_generate_command(
                    &project, counts, stop_after, fresh, json, &config,
                )
                .await
            }
            Commands::Resume {
                project,
                stop_after,
                json,
            } => commands::execute_resume_command(&project, stop_after, json, &config).await,
            Commands::Export { project, output } => {
                commands::execute_export_command(&project, output.as_deref(), &config)
            }
            Commands::Status { project, json } => {
                commands::execute_status_command(&project, json, &config)
            }
            Commands::Config => commands::execute_config_command(&config),
            Commands::Seeds { seed } => commands::execute_seeds_command(seed, &config),
        }
    });

    if let Err(error) = result {
        if let Some(lore_error) = error.downcast_ref::<LoreError>() {
            eprintln!("{}", lore_error.display_for_user());
            return Err(lore_error.to_exit_code());
        }
        eprintln!("✗ Unexpected error: {error:#}");
        eprintln!("\n  General troubleshooting:");
        eprintln!("    - Run with --verbose for more detailed output");
        eprintln!("    - Check that the state directory is writable");
        return Err(ExitCode::INTERNAL);
    }

    Ok(())
}
