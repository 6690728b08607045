//! Diagnostic logging for `mmt` commands.
//!
//! Command results go to stdout, so diagnostics always go to stderr. The
//! compact format is meant for an operator at a terminal and leaves out the
//! event target. The JSON format is meant for log collection around
//! long-running commands: it keeps targets and thread ids, because batch
//! translation interleaves events from many workers.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::subscriber::{self, SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};

use mmt_config::{Config, LogFormat};

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Errors encountered while configuring diagnostic logging.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter directive does not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Filter as configured.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Another subscriber already owns the process.
    #[error("failed to install the log subscriber: {0}")]
    Subscriber(#[source] SetGlobalDefaultError),
}

/// Installs the process-wide subscriber on first use.
///
/// Later calls keep the first configuration, so a command may call this
/// unconditionally.
pub fn initialise(config: &Config) -> Result<(), TelemetryError> {
    INSTALLED.get_or_try_init(|| install(config))?;
    Ok(())
}

fn parse_filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directive).map_err(|error| TelemetryError::Filter {
        filter: directive.to_owned(),
        message: error.to_string(),
    })
}

fn install(config: &Config) -> Result<(), TelemetryError> {
    let filter = parse_filter(config.log_filter())?;
    let base = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    match config.log_format() {
        LogFormat::Compact => subscriber::set_global_default(
            base.compact().with_target(false).finish(),
        ),
        LogFormat::Json => subscriber::set_global_default(
            base.json()
                .flatten_event(true)
                .with_target(true)
                .with_thread_ids(true)
                .finish(),
        ),
    }
    .map_err(TelemetryError::Subscriber)
}
