//! Error surface for launching, probing and signalling processes.

use std::io;

use camino::Utf8PathBuf;
use nix::errno::Errno;
use nix::sys::signal::Signal;
use thiserror::Error;

use crate::ErrorKind;

/// Errors raised while managing operating-system processes.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be started.
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The launched program reported a pid that cannot identify a process.
    #[error("launch of '{program}' did not yield a usable pid")]
    NonPositivePid {
        /// Program that was launched.
        program: String,
    },
    /// The pid does not fit the platform's pid type.
    #[error("pid {pid} is out of range for this platform")]
    PidOutOfRange {
        /// Offending pid.
        pid: u32,
    },
    /// The log file receiving process output could not be opened.
    #[error("failed to open process log '{path}': {source}")]
    OpenLog {
        /// Log file path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Probing process liveness failed.
    #[error("failed to check process {pid}: {source}")]
    CheckProcess {
        /// Probed pid.
        pid: u32,
        /// Errno returned by the probe.
        #[source]
        source: Errno,
    },
    /// Collecting the exit status of an owned child failed.
    #[error("failed to reap process {pid}: {source}")]
    Reap {
        /// Child pid.
        pid: u32,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Delivering a signal failed.
    #[error("failed to send {signal} to process {pid}: {source}")]
    Signal {
        /// Target pid.
        pid: u32,
        /// Signal that could not be delivered.
        signal: Signal,
        /// Errno returned by `kill(2)`.
        #[source]
        source: Errno,
    },
    /// Reading a pid file failed.
    #[error("failed to read pid file '{path}': {source}")]
    ReadPidFile {
        /// Pid file path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A pid file held something other than whitespace-separated integers.
    #[error("pid file '{path}' contains invalid content '{content}'")]
    ParsePidFile {
        /// Pid file path.
        path: Utf8PathBuf,
        /// Offending content.
        content: String,
    },
    /// Writing a pid file failed.
    #[error("failed to write pid file '{path}': {source}")]
    WritePidFile {
        /// Pid file path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Removing a pid file failed.
    #[error("failed to remove pid file '{path}': {source}")]
    RemovePidFile {
        /// Pid file path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

impl ProcessError {
    /// Failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Spawn { .. }
            | Self::NonPositivePid { .. }
            | Self::CheckProcess { .. }
            | Self::Reap { .. }
            | Self::Signal { .. } => ErrorKind::Subprocess,
            Self::PidOutOfRange { .. } => ErrorKind::IllegalArgument,
            Self::ParsePidFile { .. } => ErrorKind::Parse,
            Self::OpenLog { .. }
            | Self::ReadPidFile { .. }
            | Self::WritePidFile { .. }
            | Self::RemovePidFile { .. } => ErrorKind::Io,
        }
    }
}
