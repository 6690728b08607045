//! Error type of the CLI runtime.

use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use mmt_cluster::{
    ApiError, BrokerError, NodeError, TelemetryError, TranslateError, TuningError,
};
use mmt_config::EnginePathsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to initialise logging: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Paths(#[from] EnginePathsError),
    #[error(
        "tuning needs the engine language pair; set --source-language and --target-language"
    )]
    MissingLanguagePair,
    #[error("failed to list corpora in '{path}': {source}")]
    ListCorpora {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create n-best file '{path}': {source}")]
    NbestFile {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read standard input: {0}")]
    ReadInput(#[source] io::Error),
    #[error("failed to write command output: {0}")]
    Output(#[from] io::Error),
    #[error(transparent)]
    Node(#[from] NodeError),
    #[error(transparent)]
    Broker(#[from] BrokerError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Tuning(#[from] TuningError),
    #[error(transparent)]
    Translate(#[from] TranslateError),
}
