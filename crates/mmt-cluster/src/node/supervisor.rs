//! Lifecycle of the cluster node process.

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use mmt_config::{Config, EnginePaths};
use tracing::{debug, info, warn};

use super::NODE_TARGET;
use super::errors::NodeError;
use super::status::{NodeState, NodeStatus};
use crate::api::{ApiError, RestClient};
use crate::broker::EmbeddedBroker;
use crate::process::{
    LaunchSpec, PidFile, ProcessControl, RetryPolicy, read_optional_file, remove_if_exists,
};

const STOP_GRACE: Duration = Duration::from_secs(10);
const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Launch parameters and runtime file locations for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSettings {
    /// Engine the node serves.
    pub engine: String,
    /// Node program.
    pub program: String,
    /// Cluster membership and data ports.
    pub cluster_ports: [u16; 2],
    /// REST API port.
    pub api_port: u16,
    /// Whether the node should serve the REST API.
    pub serve_api: bool,
    /// Existing cluster member to join; a follower owns no broker.
    pub member: Option<String>,
    /// Node log verbosity.
    pub verbosity: Option<u8>,
    /// Node pid file.
    pub pid_path: Utf8PathBuf,
    /// Status file the node publishes.
    pub status_path: Utf8PathBuf,
    /// Directory the node writes its own logs to.
    pub logs_dir: Utf8PathBuf,
    /// File receiving the node's standard output and error.
    pub log_path: Utf8PathBuf,
    /// Budget for observing the freshly launched process.
    pub liveness: RetryPolicy,
    /// Pause between status file polls.
    pub poll_interval: Duration,
    /// Grace period granted on stop.
    pub stop_grace: Duration,
}

impl NodeSettings {
    /// Derives settings from configuration and the engine layout.
    #[must_use]
    pub fn from_config(config: &Config, paths: &EnginePaths) -> Self {
        Self {
            engine: paths.engine().to_owned(),
            program: config.node_program().to_owned(),
            cluster_ports: config.cluster_ports(),
            api_port: config.api_port(),
            serve_api: true,
            member: None,
            verbosity: None,
            pid_path: paths.node_pid_path(),
            status_path: paths.node_status_path(),
            logs_dir: paths.logs_dir().to_path_buf(),
            log_path: paths.node_log_path(),
            liveness: RetryPolicy::LIVENESS,
            poll_interval: STATUS_POLL_INTERVAL,
            stop_grace: STOP_GRACE,
        }
    }

    /// Command line used to launch the node.
    #[must_use]
    pub fn launch_spec(&self) -> LaunchSpec {
        let [cluster_port, data_port] = self.cluster_ports;
        let mut spec = LaunchSpec::new(self.program.as_str())
            .args(["-e", self.engine.as_str()])
            .args(["-p".to_owned(), cluster_port.to_string(), data_port.to_string()])
            .args(["--status-file", self.status_path.as_str()])
            .args(["--logs", self.logs_dir.as_str()]);
        if self.serve_api {
            spec = spec.arg("-a").arg(self.api_port.to_string());
        }
        if let Some(verbosity) = self.verbosity {
            spec = spec.arg("-v").arg(verbosity.to_string());
        }
        if let Some(member) = &self.member {
            spec = spec.arg("--member").arg(member.as_str());
        }
        spec.log_to(self.log_path.clone())
    }
}

/// Liveness view of a node, used by callers that only need to know whether
/// a server is up and where its API listens.
pub trait NodeLiveness {
    /// True when the recorded node process is alive.
    fn is_running(&self) -> Result<bool, NodeError>;

    /// REST API port of the node.
    fn api_port(&self) -> u16;
}

/// Supervisor owning the node process and, for a leader, its broker.
pub struct NodeSupervisor {
    control: Arc<dyn ProcessControl>,
    settings: NodeSettings,
    pid_file: PidFile,
    broker: Option<EmbeddedBroker>,
}

impl NodeSupervisor {
    /// Creates a supervisor. Pass `broker` only when this node owns it.
    #[must_use]
    pub fn new(
        control: Arc<dyn ProcessControl>,
        settings: NodeSettings,
        broker: Option<EmbeddedBroker>,
    ) -> Self {
        let pid_file = PidFile::new(settings.pid_path.clone());
        Self {
            control,
            settings,
            pid_file,
            broker,
        }
    }

    /// Launch settings.
    #[must_use]
    pub fn settings(&self) -> &NodeSettings {
        &self.settings
    }

    /// Node log file.
    #[must_use]
    pub fn log_path(&self) -> &Utf8Path {
        &self.settings.log_path
    }

    /// Client for the node's REST API on localhost.
    pub fn rest_client(&self) -> Result<RestClient, ApiError> {
        RestClient::local(self.settings.api_port)
    }

    fn live_pid(&self) -> Result<Option<u32>, NodeError> {
        let Some(pid) = self.pid_file.read()?.first().copied() else {
            return Ok(None);
        };
        if self.control.is_running(pid)? {
            Ok(Some(pid))
        } else {
            Ok(None)
        }
    }

    /// True when the recorded pid is alive.
    pub fn is_running(&self) -> Result<bool, NodeError> {
        Ok(self.live_pid()?.is_some())
    }

    /// Starts the owned broker, then the node.
    ///
    /// The pid is persisted once the process is observed alive. A node that
    /// never comes up stops the broker this call started.
    pub fn start(&self) -> Result<u32, NodeError> {
        if let Some(pid) = self.live_pid()? {
            return Err(NodeError::AlreadyRunning { pid });
        }
        if let Some(broker) = &self.broker {
            broker.start()?;
        }
        self.launch().inspect_err(|_| {
            if let Some(broker) = &self.broker
                && let Err(error) = broker.stop()
            {
                warn!(target: NODE_TARGET, %error, "failed to stop broker after node launch failure");
            }
        })
    }

    fn launch(&self) -> Result<u32, NodeError> {
        for dir in [self.settings.logs_dir.as_path(), self.runtime_dir()] {
            fs::create_dir_all(dir).map_err(|source| NodeError::Runtime {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let status = &self.settings.status_path;
        remove_if_exists(status).map_err(|source| NodeError::Runtime {
            path: status.clone(),
            source,
        })?;

        let pid = self.control.spawn(&self.settings.launch_spec())?;
        self.adopt(pid).inspect_err(|_| {
            if let Err(error) = self.control.kill(pid, Duration::ZERO) {
                warn!(target: NODE_TARGET, pid, %error, "failed to kill unrecorded node");
            }
        })?;
        info!(target: NODE_TARGET, pid, engine = %self.settings.engine, "node started");
        Ok(pid)
    }

    /// Waits for a spawned node to be observable and records its pid.
    fn adopt(&self, pid: u32) -> Result<(), NodeError> {
        let alive = self.settings.liveness.poll(|attempt| {
            debug!(target: NODE_TARGET, pid, attempt, "checking node liveness");
            self.control.is_running(pid)
        })?;
        if !alive {
            return Err(NodeError::StartupFailed {
                log: self.settings.log_path.clone(),
            });
        }
        self.pid_file.write(&[pid])?;
        Ok(())
    }

    fn runtime_dir(&self) -> &Utf8Path {
        self.settings
            .status_path
            .parent()
            .unwrap_or_else(|| Utf8Path::new("."))
    }

    /// Kills the node with a bounded grace period, then stops the owned
    /// broker.
    pub fn stop(&self) -> Result<(), NodeError> {
        let pid = self.live_pid()?.ok_or(NodeError::NotRunning)?;
        self.control.kill(pid, self.settings.stop_grace)?;
        self.pid_file.remove()?;
        info!(target: NODE_TARGET, pid, "node stopped");
        if let Some(broker) = &self.broker {
            if broker.is_running()? {
                broker.stop()?;
            } else {
                warn!(target: NODE_TARGET, "embedded broker was not running at node shutdown");
            }
        }
        Ok(())
    }

    /// Parsed status file, or `None` when the node is down or has not
    /// published anything yet.
    pub fn state(&self) -> Result<Option<NodeState>, NodeError> {
        if !self.is_running()? {
            return Ok(None);
        }
        let path = &self.settings.status_path;
        let content = read_optional_file(path).map_err(|source| NodeError::ReadStatus {
            path: path.clone(),
            source,
        })?;
        content
            .map(|text| NodeState::parse(&text))
            .transpose()
            .map_err(|source| NodeError::ParseStatus {
                path: path.clone(),
                source,
            })
    }

    /// Current status; [`NodeStatus::None`] when no state is available.
    pub fn status(&self) -> Result<NodeStatus, NodeError> {
        Ok(self
            .state()?
            .map_or(NodeStatus::None, |state| state.status()))
    }

    /// Blocks until the node reaches `target`.
    ///
    /// A node that dies while waiting is treated as [`NodeStatus::Error`].
    /// There is no upper bound on the wait.
    pub fn wait_for_status(&self, target: NodeStatus) -> Result<NodeStatus, NodeError> {
        let mut current = self.status()?;
        let mut reported = current;
        while !current.has_reached(target) {
            thread::sleep(self.settings.poll_interval);
            current = if self.is_running()? {
                self.status()?
            } else {
                NodeStatus::Error
            };
            if current != reported {
                info!(target: NODE_TARGET, status = %current, "node status changed");
                reported = current;
            }
        }
        if current == NodeStatus::Error {
            return Err(NodeError::Failed {
                log: self.settings.log_path.clone(),
            });
        }
        Ok(current)
    }
}

impl NodeLiveness for NodeSupervisor {
    fn is_running(&self) -> Result<bool, NodeError> {
        Self::is_running(self)
    }

    fn api_port(&self) -> u16 {
        self.settings.api_port
    }
}
