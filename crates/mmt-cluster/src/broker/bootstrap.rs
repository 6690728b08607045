//! Start and stop sequencing for the embedded broker pair.

use std::fs::{self, File};
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use mmt_config::{Config, EnginePaths};
use tracing::{debug, info, warn};

use super::BROKER_TARGET;
use super::config::{BrokerEndpoint, render_broker_config, render_coordination_config};
use super::errors::BrokerError;
use super::probe::{BROKER_READY_MARKER, log_contains_marker, probe_coordination};
use crate::process::{LaunchSpec, PidFile, ProcessControl, RetryPolicy};

const STOP_GRACE: Duration = Duration::from_secs(5);

/// Everything needed to launch the broker pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    /// Ports and data directory.
    pub endpoint: BrokerEndpoint,
    /// Broker distribution root containing `bin/`.
    pub home: Utf8PathBuf,
    /// Pid file recording the pair.
    pub pid_path: Utf8PathBuf,
    /// Log file shared by both processes.
    pub log_path: Utf8PathBuf,
    /// Probe budget applied to each process after launch.
    pub health_check: RetryPolicy,
    /// Grace period granted to the broker on stop.
    pub stop_grace: Duration,
}

impl BrokerSettings {
    /// Derives settings from configuration and the engine layout.
    #[must_use]
    pub fn from_config(config: &Config, paths: &EnginePaths) -> Self {
        Self {
            endpoint: BrokerEndpoint {
                coordination_port: config.coordination_port(),
                broker_port: config.broker_port(),
                data_dir: absolute(&paths.broker_data_dir()),
            },
            home: config.broker_home(),
            pid_path: paths.broker_pid_path(),
            log_path: paths.broker_log_path(),
            health_check: RetryPolicy::HEALTH_CHECK,
            stop_grace: STOP_GRACE,
        }
    }

    /// Start script of the coordination service.
    #[must_use]
    pub fn coordination_program(&self) -> Utf8PathBuf {
        self.home.join("bin").join("zookeeper-server-start.sh")
    }

    /// Start script of the broker.
    #[must_use]
    pub fn broker_program(&self) -> Utf8PathBuf {
        self.home.join("bin").join("kafka-server-start.sh")
    }
}

/// Pids recorded for a running pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerPids {
    /// Message broker pid.
    pub broker: u32,
    /// Coordination service pid.
    pub coordination: u32,
}

/// Supervisor for the coordination service and message broker.
pub struct EmbeddedBroker {
    control: Arc<dyn ProcessControl>,
    settings: BrokerSettings,
    pid_file: PidFile,
}

impl EmbeddedBroker {
    /// Creates a supervisor; nothing is launched until [`Self::start`].
    #[must_use]
    pub fn new(control: Arc<dyn ProcessControl>, settings: BrokerSettings) -> Self {
        let pid_file = PidFile::new(settings.pid_path.clone());
        Self {
            control,
            settings,
            pid_file,
        }
    }

    /// Launch settings.
    #[must_use]
    pub fn settings(&self) -> &BrokerSettings {
        &self.settings
    }

    /// Pids in the pid file, whether or not they are alive.
    pub fn recorded_pids(&self) -> Result<Option<BrokerPids>, BrokerError> {
        match self.pid_file.read()?.as_slice() {
            [] => Ok(None),
            [broker, coordination] => Ok(Some(BrokerPids {
                broker: *broker,
                coordination: *coordination,
            })),
            _ => Err(BrokerError::MalformedPidFile {
                path: self.pid_file.path().to_path_buf(),
            }),
        }
    }

    /// True when the recorded broker pid is alive.
    pub fn is_running(&self) -> Result<bool, BrokerError> {
        Ok(self.live_pids()?.is_some())
    }

    fn live_pids(&self) -> Result<Option<BrokerPids>, BrokerError> {
        match self.recorded_pids()? {
            Some(pids) if self.control.is_running(pids.broker)? => Ok(Some(pids)),
            _ => Ok(None),
        }
    }

    /// Launches and health-checks the coordination service, then the broker.
    ///
    /// The pid pair is persisted only once both pass their checks. On any
    /// failure every process launched by this call is killed.
    pub fn start(&self) -> Result<BrokerPids, BrokerError> {
        if let Some(pids) = self.live_pids()? {
            return Err(BrokerError::AlreadyRunning { pid: pids.broker });
        }
        self.prepare()?;

        let mut launch = PartialLaunch::new(self.control.as_ref());
        let coordination = self.launch(
            self.settings.coordination_program(),
            self.settings.endpoint.coordination_config_path(),
        )?;
        launch.track(coordination);
        let port = self.settings.endpoint.coordination_port;
        let healthy = self.settings.health_check.poll(|attempt| {
            debug!(target: BROKER_TARGET, attempt, port, "probing coordination service");
            Ok::<_, BrokerError>(probe_coordination(port))
        })?;
        if !healthy {
            return Err(BrokerError::CoordinationUnhealthy {
                log: self.settings.log_path.clone(),
            });
        }

        let broker = self.launch(
            self.settings.broker_program(),
            self.settings.endpoint.broker_config_path(),
        )?;
        launch.track(broker);
        let log = &self.settings.log_path;
        let ready = self.settings.health_check.poll(|attempt| {
            debug!(target: BROKER_TARGET, attempt, file = %log, "scanning broker log");
            log_contains_marker(log, BROKER_READY_MARKER).map_err(|source| BrokerError::Log {
                path: log.clone(),
                source,
            })
        })?;
        if !ready {
            return Err(BrokerError::BrokerUnhealthy { log: log.clone() });
        }

        self.pid_file.write(&[broker, coordination])?;
        launch.commit();
        info!(
            target: BROKER_TARGET,
            broker,
            coordination,
            "embedded broker started"
        );
        Ok(BrokerPids {
            broker,
            coordination,
        })
    }

    /// Kills the broker with a bounded grace period, then the coordination
    /// service.
    pub fn stop(&self) -> Result<(), BrokerError> {
        let pids = self.live_pids()?.ok_or(BrokerError::NotRunning)?;
        self.control.kill(pids.broker, self.settings.stop_grace)?;
        self.control.kill(pids.coordination, Duration::ZERO)?;
        self.pid_file.remove()?;
        info!(
            target: BROKER_TARGET,
            broker = pids.broker,
            coordination = pids.coordination,
            "embedded broker stopped"
        );
        Ok(())
    }

    fn prepare(&self) -> Result<(), BrokerError> {
        let endpoint = &self.settings.endpoint;
        let coordination_data = endpoint.coordination_data_dir();
        let broker_data = endpoint.broker_data_dir();
        for dir in [&coordination_data, &broker_data] {
            create_dir(dir)?;
        }
        write_config(
            &endpoint.coordination_config_path(),
            &render_coordination_config(&coordination_data, endpoint.coordination_port),
        )?;
        write_config(
            &endpoint.broker_config_path(),
            &render_broker_config(
                &broker_data,
                endpoint.broker_port,
                endpoint.coordination_port,
            ),
        )?;

        let log = &self.settings.log_path;
        if let Some(parent) = log.parent() {
            create_dir(parent)?;
        }
        File::create(log).map_err(|source| BrokerError::Log {
            path: log.clone(),
            source,
        })?;
        Ok(())
    }

    fn launch(&self, program: Utf8PathBuf, config: Utf8PathBuf) -> Result<u32, BrokerError> {
        let spec = LaunchSpec::new(program.into_string())
            .arg(config.into_string())
            .log_to(self.settings.log_path.clone());
        Ok(self.control.spawn(&spec)?)
    }
}

/// Kills tracked processes, most recent first, unless committed.
struct PartialLaunch<'a> {
    control: &'a dyn ProcessControl,
    pids: Vec<u32>,
}

impl<'a> PartialLaunch<'a> {
    fn new(control: &'a dyn ProcessControl) -> Self {
        Self {
            control,
            pids: Vec::new(),
        }
    }

    fn track(&mut self, pid: u32) {
        self.pids.push(pid);
    }

    fn commit(mut self) {
        self.pids.clear();
    }
}

impl Drop for PartialLaunch<'_> {
    fn drop(&mut self) {
        while let Some(pid) = self.pids.pop() {
            if let Err(error) = self.control.kill(pid, Duration::ZERO) {
                warn!(
                    target: BROKER_TARGET,
                    pid,
                    %error,
                    "failed to kill partially started process"
                );
            }
        }
    }
}

fn create_dir(path: &Utf8Path) -> Result<(), BrokerError> {
    fs::create_dir_all(path).map_err(|source| BrokerError::PrepareDirectory {
        path: path.to_path_buf(),
        source,
    })
}

fn write_config(path: &Utf8Path, contents: &str) -> Result<(), BrokerError> {
    fs::write(path, contents).map_err(|source| BrokerError::WriteConfig {
        path: path.to_path_buf(),
        source,
    })
}

fn absolute(path: &Utf8Path) -> Utf8PathBuf {
    std::path::absolute(path)
        .ok()
        .and_then(|resolved| Utf8PathBuf::from_path_buf(resolved).ok())
        .unwrap_or_else(|| path.to_path_buf())
}
