//! Handlers for the `mmt` subcommands.
//!
//! Each handler builds the collaborators it needs from [`Config`] and writes
//! user-facing lines through [`CommandOutput`]. Failures surface as
//! [`AppError`] values that the runner prints on stderr.

mod domain;
mod node;
mod translate;
mod tune;

use std::io::{self, Write};

use mmt_config::Config;

use crate::AppError;
use crate::cli::CliCommand;
use crate::output::CommandOutput;

pub(crate) use translate::translate;

pub(crate) fn dispatch<W: Write, E: Write>(
    command: &CliCommand,
    config: &Config,
    output: &mut CommandOutput<W, E>,
) -> Result<(), AppError> {
    match command {
        CliCommand::Start(args) => node::start(config, args, output),
        CliCommand::Stop => node::stop(config, output),
        CliCommand::Status => node::status(config, output),
        CliCommand::Tune(args) => tune::tune(config, args, output),
        CliCommand::Translate(args) => translate(config, args, io::stdin().lock(), output),
        CliCommand::Domain { action } => domain::domain(config, action, output),
    }
}
