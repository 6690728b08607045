use std::fs::{File, OpenOptions};
use std::process::Command;

use camino::Utf8Path;
use tracing::debug;

use super::TUNING_TARGET;
use super::errors::TuningError;

/// Opens `path` for appending, creating it when missing.
pub(super) fn open_log(path: &Utf8Path) -> Result<File, TuningError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| TuningError::OpenLog {
            path: path.to_owned(),
            source,
        })
}

/// Runs a fully configured command and waits for it to exit.
pub(super) fn run_to_completion(
    command: &mut Command,
    program: &str,
    log: &Utf8Path,
) -> Result<(), TuningError> {
    debug!(target: TUNING_TARGET, program, log = %log, "running subprocess");
    let status = command.status().map_err(|source| TuningError::Spawn {
        program: program.to_owned(),
        source,
    })?;
    if status.success() {
        return Ok(());
    }
    Err(TuningError::Subprocess {
        program: program.to_owned(),
        code: status.code(),
        log: log.to_owned(),
    })
}
