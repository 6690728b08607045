//! Command-line runtime of the `mmt` command.
//!
//! The runtime splits configuration flags from the command, loads layered
//! configuration, installs telemetry and dispatches to a command handler.
//! Output streams and the configuration loader are injected so tests can
//! drive the runtime without a terminal.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use mmt_cluster::telemetry;
use mmt_config::Config;

mod cli;
mod commands;
mod config;
mod errors;
mod output;

use cli::Cli;
use config::{command_arguments, split_config_arguments};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
pub(crate) use errors::AppError;
use output::CommandOutput;

/// CLI flags recognised by the configuration loader.
///
/// MAINTENANCE: keep in sync with the fields of `mmt_config::Config`.
const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--engine",
    "--engines-dir",
    "--runtime-dir",
    "--source-language",
    "--target-language",
    "--api-port",
    "--cluster-port",
    "--data-port",
    "--coordination-port",
    "--broker-port",
    "--node-program",
    "--broker-home",
    "--optimizer-script",
    "--optimizer-interface",
    "--optimizer-bin-dir",
    "--tokenizer-program",
    "--log-filter",
    "--log-format",
];

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let arguments: Vec<OsString> = args.into_iter().collect();
    let mut output = CommandOutput::new(stdout, stderr);
    match execute(&arguments, loader, &mut output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            match write!(output.stdout, "{}", error.render()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            }
        }
        Err(error) => {
            // Nothing is left to report to once stderr itself fails.
            output.stderr_line(format_args!("{error}")).ok();
            ExitCode::FAILURE
        }
    }
}

fn execute<W: Write, E: Write, L: ConfigLoader>(
    args: &[OsString],
    loader: &L,
    output: &mut CommandOutput<W, E>,
) -> Result<(), AppError> {
    let split = split_config_arguments(args);
    let cli = Cli::try_parse_from(command_arguments(args, &split)).map_err(AppError::CliUsage)?;
    let config: Config = loader.load(&split.config_arguments)?;
    telemetry::initialise(&config)?;
    commands::dispatch(&cli.command, &config, output)
}

#[cfg(test)]
mod tests;
