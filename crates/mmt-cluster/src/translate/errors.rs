use std::io;

use thiserror::Error;

use crate::ErrorKind;
use crate::api::ApiError;

/// Errors raised while translating.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// Explicit context weights could not be parsed.
    #[error("invalid context weights map: {text}")]
    InvalidContextWeights {
        /// Weights as supplied.
        text: String,
    },
    /// A translation could not be written out.
    #[error("failed to write translation output: {source}")]
    Output {
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A batch worker panicked.
    #[error("translation worker terminated unexpectedly")]
    WorkerPanicked,
    /// The API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl TranslateError {
    /// Failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidContextWeights { .. } => ErrorKind::IllegalArgument,
            Self::Output { .. } => ErrorKind::Io,
            Self::WorkerPanicked => ErrorKind::IllegalState,
            Self::Api(error) => error.kind(),
        }
    }
}

impl From<io::Error> for TranslateError {
    fn from(source: io::Error) -> Self {
        Self::Output { source }
    }
}
