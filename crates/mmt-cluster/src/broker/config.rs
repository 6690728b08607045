use camino::{Utf8Path, Utf8PathBuf};

/// Ports and storage of the embedded broker pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    /// Client port of the coordination service.
    pub coordination_port: u16,
    /// Listener port of the broker.
    pub broker_port: u16,
    /// Directory holding generated configuration and both data directories.
    pub data_dir: Utf8PathBuf,
}

impl BrokerEndpoint {
    /// Data directory of the coordination service.
    #[must_use]
    pub fn coordination_data_dir(&self) -> Utf8PathBuf {
        self.data_dir.join("zdata")
    }

    /// Log directory of the broker.
    #[must_use]
    pub fn broker_data_dir(&self) -> Utf8PathBuf {
        self.data_dir.join("kdata")
    }

    /// Generated coordination service configuration file.
    #[must_use]
    pub fn coordination_config_path(&self) -> Utf8PathBuf {
        self.data_dir.join("zookeeper.properties")
    }

    /// Generated broker configuration file.
    #[must_use]
    pub fn broker_config_path(&self) -> Utf8PathBuf {
        self.data_dir.join("kafka.properties")
    }
}

/// Renders the coordination service properties.
///
/// Client connections are uncapped.
#[must_use]
pub fn render_coordination_config(data_dir: &Utf8Path, client_port: u16) -> String {
    format!("dataDir={data_dir}\nclientPort={client_port}\nmaxClientCnxns=0\n")
}

/// Renders the single-partition broker properties.
///
/// Retention is effectively unbounded (8 760 000 hours).
#[must_use]
pub fn render_broker_config(
    log_dir: &Utf8Path,
    listener_port: u16,
    coordination_port: u16,
) -> String {
    format!(
        "broker.id=0\n\
         listeners=PLAINTEXT://0.0.0.0:{listener_port}\n\
         log.dirs={log_dir}\n\
         num.partitions=1\n\
         log.retention.hours=8760000\n\
         zookeeper.connect=localhost:{coordination_port}\n"
    )
}
