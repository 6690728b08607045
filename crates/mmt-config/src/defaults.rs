use crate::logging::LogFormat;

/// Engine served when none is configured.
pub const DEFAULT_ENGINE: &str = "default";

/// Directory holding engine folders.
pub const DEFAULT_ENGINES_DIR: &str = "engines";

/// Directory holding per-engine runtime artefacts.
pub const DEFAULT_RUNTIME_DIR: &str = "runtime";

/// Port of the node's REST API.
pub const DEFAULT_API_PORT: u16 = 8045;

/// First cluster port, used for membership.
pub const DEFAULT_CLUSTER_PORT: u16 = 5016;

/// Second cluster port, used for data exchange.
pub const DEFAULT_DATA_PORT: u16 = 5017;

/// Client port of the embedded coordination service.
pub const DEFAULT_COORDINATION_PORT: u16 = 2181;

/// Listener port of the embedded message broker.
pub const DEFAULT_BROKER_PORT: u16 = 9092;

/// Program launched as the cluster node.
pub const DEFAULT_NODE_PROGRAM: &str = "mmt-node";

/// Program tokenizing reference corpora.
pub const DEFAULT_TOKENIZER_PROGRAM: &str = "mmt-tokenize";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format; the supervisor is mostly driven interactively.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}
