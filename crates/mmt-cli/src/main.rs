//! Entry point of the `mmt` command.
//!
//! All work happens in [`mmt_cli::run`], which loads configuration, parses the
//! command line and dispatches to the node, tuning, translation and domain
//! commands.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    mmt_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
