use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

use super::PROCESS_TARGET;
use super::errors::ProcessError;
use super::files::{atomic_write, read_optional_file, remove_if_exists};

/// A file recording one or more pids, separated by single spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidFile {
    path: Utf8PathBuf,
}

impl PidFile {
    /// Wraps the pid file at `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the pid file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Reads the recorded pids.
    ///
    /// A missing or blank file yields an empty list.
    pub fn read(&self) -> Result<Vec<u32>, ProcessError> {
        let recorded = read_optional_file(&self.path).map_err(|source| {
            ProcessError::ReadPidFile {
                path: self.path.clone(),
                source,
            }
        })?;
        let Some(content) = recorded else {
            return Ok(Vec::new());
        };
        content
            .split_whitespace()
            .map(|token| {
                token.parse::<u32>().map_err(|_| ProcessError::ParsePidFile {
                    path: self.path.clone(),
                    content: content.trim().to_owned(),
                })
            })
            .collect()
    }

    /// Replaces the file content with `pids`.
    ///
    /// A zero pid never identifies a launched process and is rejected.
    pub fn write(&self, pids: &[u32]) -> Result<(), ProcessError> {
        if pids.contains(&0) {
            return Err(ProcessError::NonPositivePid {
                program: self.path.to_string(),
            });
        }
        let line = pids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        atomic_write(&self.path, line.as_bytes()).map_err(|source| {
            ProcessError::WritePidFile {
                path: self.path.clone(),
                source,
            }
        })?;
        info!(
            target: PROCESS_TARGET,
            pids = %line,
            file = %self.path,
            "pid file written"
        );
        Ok(())
    }

    /// Deletes the file if present.
    pub fn remove(&self) -> Result<(), ProcessError> {
        remove_if_exists(&self.path).map_err(|source| ProcessError::RemovePidFile {
            path: self.path.clone(),
            source,
        })?;
        debug!(target: PROCESS_TARGET, file = %self.path, "pid file removed");
        Ok(())
    }
}
