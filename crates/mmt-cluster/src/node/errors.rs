use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

use super::status::NodeStatusParseError;
use crate::ErrorKind;
use crate::broker::BrokerError;
use crate::process::ProcessError;

/// Errors raised while supervising the cluster node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// A live node is already recorded.
    #[error("node is already running (pid {pid})")]
    AlreadyRunning {
        /// Recorded node pid.
        pid: u32,
    },
    /// No live node is recorded.
    #[error("node is not running")]
    NotRunning,
    /// The node never became observable after launch.
    #[error("failed to start node, check log file for more details: {log}")]
    StartupFailed {
        /// Node log file.
        log: Utf8PathBuf,
    },
    /// The node died or reported an error while being waited on.
    #[error("node failed, check log file for more details: {log}")]
    Failed {
        /// Node log file.
        log: Utf8PathBuf,
    },
    /// Runtime files could not be prepared.
    #[error("failed to prepare node runtime file '{path}': {source}")]
    Runtime {
        /// Path involved.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The status file could not be read.
    #[error("failed to read node status file '{path}': {source}")]
    ReadStatus {
        /// Status file path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The status file held a malformed line.
    #[error("malformed node status file '{path}': {source}")]
    ParseStatus {
        /// Status file path.
        path: Utf8PathBuf,
        /// Parse failure.
        #[source]
        source: NodeStatusParseError,
    },
    /// The embedded broker failed.
    #[error(transparent)]
    Broker(#[from] BrokerError),
    /// A process operation failed.
    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl NodeError {
    /// Failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyRunning { .. } | Self::NotRunning => ErrorKind::IllegalState,
            Self::StartupFailed { .. } | Self::Failed { .. } => ErrorKind::Subprocess,
            Self::Runtime { .. } | Self::ReadStatus { .. } => ErrorKind::Io,
            Self::ParseStatus { .. } => ErrorKind::Parse,
            Self::Broker(error) => error.kind(),
            Self::Process(error) => error.kind(),
        }
    }
}
