use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::ErrorKind;
use crate::process::ProcessError;

/// Errors raised while bootstrapping or stopping the broker pair.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// A live broker is already recorded.
    #[error("embedded broker is already running (pid {pid})")]
    AlreadyRunning {
        /// Recorded broker pid.
        pid: u32,
    },
    /// No live broker is recorded.
    #[error("embedded broker is not running")]
    NotRunning,
    /// The pid file does not hold a broker and coordination pid pair.
    #[error("broker pid file '{path}' does not hold a pid pair")]
    MalformedPidFile {
        /// Pid file path.
        path: Utf8PathBuf,
    },
    /// A data or log directory could not be created.
    #[error("failed to prepare broker directory '{path}': {source}")]
    PrepareDirectory {
        /// Directory path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Generated configuration could not be written.
    #[error("failed to write broker configuration '{path}': {source}")]
    WriteConfig {
        /// Configuration path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The shared log file could not be reset or scanned.
    #[error("failed to access broker log '{path}': {source}")]
    Log {
        /// Log path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The coordination service never answered its health probe.
    #[error("failed to start zookeeper, check log file for more details: {log}")]
    CoordinationUnhealthy {
        /// Shared broker log.
        log: Utf8PathBuf,
    },
    /// The broker never logged its ready marker.
    #[error("failed to start kafka, check log file for more details: {log}")]
    BrokerUnhealthy {
        /// Shared broker log.
        log: Utf8PathBuf,
    },
    /// A process operation failed.
    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl BrokerError {
    /// Failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyRunning { .. }
            | Self::NotRunning
            | Self::CoordinationUnhealthy { .. }
            | Self::BrokerUnhealthy { .. } => ErrorKind::IllegalState,
            Self::MalformedPidFile { .. } => ErrorKind::Parse,
            Self::PrepareDirectory { .. } | Self::WriteConfig { .. } | Self::Log { .. } => {
                ErrorKind::Io
            }
            Self::Process(error) => error.kind(),
        }
    }
}
