use std::io;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use thiserror::Error;

use super::output::OptimizerOutputError;
use crate::ErrorKind;
use crate::api::ApiError;
use crate::node::NodeError;

/// Errors raised by a tuning run.
#[derive(Debug, Error)]
pub enum TuningError {
    /// No corpora were supplied.
    #[error("empty corpora")]
    EmptyCorpora,
    /// The node to tune is not running.
    #[error("no MMT server running, start the engine first")]
    NoServerRunning,
    /// Tuning corpora could not be listed.
    #[error("failed to list corpora in {path}: {source}")]
    ListCorpora {
        /// Corpora folder.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The working directory could not be prepared.
    #[error("failed to prepare tuning directory {path}: {source}")]
    Workspace {
        /// Directory path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A path produced by the operating system is not UTF-8.
    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path {
        /// Offending path.
        path: PathBuf,
    },
    /// A merged corpus file could not be written.
    #[error("failed to merge corpora into {path}: {source}")]
    Merge {
        /// Merged file path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A corpus file could not be opened for a subprocess.
    #[error("failed to open corpus file {path}: {source}")]
    CorpusFile {
        /// Corpus file path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A subprocess log could not be opened.
    #[error("failed to open log file {path}: {source}")]
    OpenLog {
        /// Log path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A subprocess could not be launched.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        /// Program name.
        program: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A subprocess exited unsuccessfully.
    #[error("{program} failed with exit code {}, check log file for more details: {log}", code.map_or_else(|| "none".to_owned(), |code| code.to_string()))]
    Subprocess {
        /// Program name.
        program: String,
        /// Exit code, absent when killed by a signal.
        code: Option<i32>,
        /// Log capturing the subprocess output.
        log: Utf8PathBuf,
    },
    /// The optimizer's output file could not be read.
    #[error("failed to read optimizer output {path}: {source}")]
    ReadOutput {
        /// Output path.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The optimizer's output is malformed.
    #[error("malformed optimizer output {path}: {source}")]
    ParseOutput {
        /// Output path.
        path: Utf8PathBuf,
        /// Parse failure.
        #[source]
        source: OptimizerOutputError,
    },
    /// The node could not be queried.
    #[error(transparent)]
    Node(#[from] NodeError),
    /// The weight update failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl TuningError {
    /// Failure class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyCorpora => ErrorKind::IllegalArgument,
            Self::NoServerRunning => ErrorKind::IllegalState,
            Self::ListCorpora { .. }
            | Self::Workspace { .. }
            | Self::NonUtf8Path { .. }
            | Self::Merge { .. }
            | Self::CorpusFile { .. }
            | Self::OpenLog { .. }
            | Self::ReadOutput { .. } => ErrorKind::Io,
            Self::Spawn { .. } | Self::Subprocess { .. } => ErrorKind::Subprocess,
            Self::ParseOutput { .. } => ErrorKind::Parse,
            Self::Node(error) => error.kind(),
            Self::Api(error) => error.kind(),
        }
    }
}
