//! Shared configuration for the `mmt` command and the cluster supervisor.
//!
//! Settings load through `ortho_config`, layering built-in defaults, an
//! optional configuration file, `MMT_*` environment variables and command-line
//! flags. Every field is optional so the same structure can be merged from any
//! layer; accessor methods fill in the documented defaults.

mod defaults;
mod logging;
mod paths;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_API_PORT, DEFAULT_BROKER_PORT, DEFAULT_CLUSTER_PORT, DEFAULT_COORDINATION_PORT,
    DEFAULT_DATA_PORT, DEFAULT_ENGINE, DEFAULT_ENGINES_DIR, DEFAULT_LOG_FILTER,
    DEFAULT_NODE_PROGRAM, DEFAULT_RUNTIME_DIR, DEFAULT_TOKENIZER_PROGRAM, default_log_filter,
    default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use paths::{EnginePaths, EnginePathsError};

/// Layered settings for one engine and its cluster node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "MMT")]
pub struct Config {
    /// Name of the engine the node serves.
    pub engine: Option<String>,
    /// Directory containing one sub-directory per engine.
    pub engines_dir: Option<String>,
    /// Directory receiving per-engine runtime artefacts.
    pub runtime_dir: Option<String>,
    /// Language the engine translates from.
    pub source_language: Option<String>,
    /// Language the engine translates into.
    pub target_language: Option<String>,
    /// Port of the node's REST API.
    pub api_port: Option<u16>,
    /// Port of the cluster membership protocol.
    pub cluster_port: Option<u16>,
    /// Port of the cluster data channel.
    pub data_port: Option<u16>,
    /// Client port of the embedded coordination service.
    pub coordination_port: Option<u16>,
    /// Listener port of the embedded message broker.
    pub broker_port: Option<u16>,
    /// Program launched as the cluster node.
    pub node_program: Option<String>,
    /// Installation directory of the broker distribution.
    pub broker_home: Option<String>,
    /// Optimizer driver script used by tuning.
    pub optimizer_script: Option<String>,
    /// Decoder interface script the optimizer calls back into.
    pub optimizer_interface: Option<String>,
    /// Directory holding the optimizer's helper binaries.
    pub optimizer_bin_dir: Option<String>,
    /// Program tokenizing reference corpora.
    pub tokenizer_program: Option<String>,
    /// Tracing filter expression.
    pub log_filter: Option<String>,
    /// Log output format.
    pub log_format: Option<LogFormat>,
}

impl Config {
    /// Engine name, defaulting to [`DEFAULT_ENGINE`].
    #[must_use]
    pub fn engine(&self) -> &str {
        self.engine.as_deref().unwrap_or(DEFAULT_ENGINE)
    }

    /// Root directory for engine models and data.
    #[must_use]
    pub fn engines_dir(&self) -> &Utf8Path {
        Utf8Path::new(self.engines_dir.as_deref().unwrap_or(DEFAULT_ENGINES_DIR))
    }

    /// Root directory for runtime artefacts.
    #[must_use]
    pub fn runtime_dir(&self) -> &Utf8Path {
        Utf8Path::new(self.runtime_dir.as_deref().unwrap_or(DEFAULT_RUNTIME_DIR))
    }

    /// Source and target language, when both are configured.
    #[must_use]
    pub fn language_pair(&self) -> Option<(&str, &str)> {
        self.source_language
            .as_deref()
            .zip(self.target_language.as_deref())
    }

    /// REST API port.
    #[must_use]
    pub fn api_port(&self) -> u16 {
        self.api_port.unwrap_or(DEFAULT_API_PORT)
    }

    /// Cluster membership and data ports, in launch order.
    #[must_use]
    pub fn cluster_ports(&self) -> [u16; 2] {
        [
            self.cluster_port.unwrap_or(DEFAULT_CLUSTER_PORT),
            self.data_port.unwrap_or(DEFAULT_DATA_PORT),
        ]
    }

    /// Coordination service client port.
    #[must_use]
    pub fn coordination_port(&self) -> u16 {
        self.coordination_port.unwrap_or(DEFAULT_COORDINATION_PORT)
    }

    /// Message broker listener port.
    #[must_use]
    pub fn broker_port(&self) -> u16 {
        self.broker_port.unwrap_or(DEFAULT_BROKER_PORT)
    }

    /// Node program name or path.
    #[must_use]
    pub fn node_program(&self) -> &str {
        self.node_program.as_deref().unwrap_or(DEFAULT_NODE_PROGRAM)
    }

    /// Broker installation directory, relative to the working directory
    /// unless configured.
    #[must_use]
    pub fn broker_home(&self) -> Utf8PathBuf {
        self.broker_home
            .as_deref()
            .map_or_else(|| Utf8PathBuf::from("vendor/kafka"), Utf8PathBuf::from)
    }

    /// Optimizer driver script.
    #[must_use]
    pub fn optimizer_script(&self) -> Utf8PathBuf {
        self.optimizer_script.as_deref().map_or_else(
            || Utf8PathBuf::from("vendor/moses/scripts/training/mert-moses.pl"),
            Utf8PathBuf::from,
        )
    }

    /// Decoder interface script passed to the optimizer.
    #[must_use]
    pub fn optimizer_interface(&self) -> Utf8PathBuf {
        self.optimizer_interface.as_deref().map_or_else(
            || Utf8PathBuf::from("scripts/mert-interface.py"),
            Utf8PathBuf::from,
        )
    }

    /// Optimizer helper binary directory.
    #[must_use]
    pub fn optimizer_bin_dir(&self) -> Utf8PathBuf {
        self.optimizer_bin_dir
            .as_deref()
            .map_or_else(|| Utf8PathBuf::from("vendor/moses/bin"), Utf8PathBuf::from)
    }

    /// Tokenizer program name or path.
    #[must_use]
    pub fn tokenizer_program(&self) -> &str {
        self.tokenizer_program
            .as_deref()
            .unwrap_or(DEFAULT_TOKENIZER_PROGRAM)
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(default_log_format)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn defaults_fill_unset_fields() {
        let config = Config::default();
        assert_eq!(config.engine(), "default");
        assert_eq!(config.api_port(), 8045);
        assert_eq!(config.cluster_ports(), [5016, 5017]);
        assert_eq!(config.coordination_port(), 2181);
        assert_eq!(config.broker_port(), 9092);
        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.log_format(), LogFormat::Compact);
    }

    #[rstest]
    fn explicit_values_win_over_defaults() {
        let config = Config {
            engine: Some("en-it".to_owned()),
            api_port: Some(9000),
            data_port: Some(6000),
            ..Config::default()
        };
        assert_eq!(config.engine(), "en-it");
        assert_eq!(config.api_port(), 9000);
        assert_eq!(config.cluster_ports(), [5016, 6000]);
    }

    #[rstest]
    #[case(Some("en"), Some("it"), Some(("en", "it")))]
    #[case(Some("en"), None, None)]
    #[case(None, Some("it"), None)]
    fn language_pair_needs_both_sides(
        #[case] source: Option<&str>,
        #[case] target: Option<&str>,
        #[case] expected: Option<(&str, &str)>,
    ) {
        let config = Config {
            source_language: source.map(str::to_owned),
            target_language: target.map(str::to_owned),
            ..Config::default()
        };
        assert_eq!(config.language_pair(), expected);
    }
}
