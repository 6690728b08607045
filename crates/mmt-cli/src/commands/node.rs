//! `mmt start`, `mmt stop` and `mmt status`.

use std::io::Write;
use std::sync::Arc;

use mmt_cluster::broker::BrokerSettings;
use mmt_cluster::node::NodeSettings;
use mmt_cluster::{
    EmbeddedBroker, NodeError, NodeStatus, NodeSupervisor, ProcessControl, SystemProcessControl,
};
use mmt_config::{Config, EnginePaths};
use tracing::warn;

use crate::AppError;
use crate::cli::StartArgs;
use crate::output::CommandOutput;

fn system_control() -> Arc<dyn ProcessControl> {
    Arc::new(SystemProcessControl::new())
}

fn embedded_broker(
    control: &Arc<dyn ProcessControl>,
    config: &Config,
    paths: &EnginePaths,
) -> EmbeddedBroker {
    EmbeddedBroker::new(Arc::clone(control), BrokerSettings::from_config(config, paths))
}

pub(super) fn start<W: Write, E: Write>(
    config: &Config,
    args: &StartArgs,
    output: &mut CommandOutput<W, E>,
) -> Result<(), AppError> {
    let paths = EnginePaths::prepare(config)?;
    let control = system_control();
    let mut settings = NodeSettings::from_config(config, &paths);
    settings.serve_api = !args.no_api;
    settings.member.clone_from(&args.member);
    settings.verbosity = args.verbosity;
    let broker = args
        .member
        .is_none()
        .then(|| embedded_broker(&control, config, &paths));
    let supervisor = NodeSupervisor::new(control, settings, broker);

    output.stdout_line(format_args!("Starting MMT engine '{}'...", paths.engine()))?;
    let pid = supervisor.start()?;
    if let Err(error) = supervisor.wait_for_status(NodeStatus::Ready) {
        if let Err(stop_error) = supervisor.stop() {
            warn!(error = %stop_error, "failed to stop node after startup failure");
        }
        return Err(error.into());
    }

    output.stdout_line(format_args!(
        "MMT engine '{}' is ready (pid {pid})",
        paths.engine()
    ))?;
    if supervisor.settings().serve_api {
        output.stdout_line(format_args!(
            "REST API available at http://localhost:{}/",
            supervisor.settings().api_port
        ))?;
    }
    Ok(())
}

pub(super) fn stop<W: Write, E: Write>(
    config: &Config,
    output: &mut CommandOutput<W, E>,
) -> Result<(), AppError> {
    let paths = EnginePaths::derive(config);
    let control = system_control();
    let broker = embedded_broker(&control, config, &paths);
    let owned = broker.recorded_pids()?.is_some().then_some(broker);
    let supervisor = NodeSupervisor::new(
        Arc::clone(&control),
        NodeSettings::from_config(config, &paths),
        owned,
    );

    match supervisor.stop() {
        Ok(()) => {
            output.stdout_line(format_args!("MMT engine '{}' stopped", paths.engine()))?;
        }
        Err(NodeError::NotRunning) => {
            let orphan = embedded_broker(&control, config, &paths);
            if orphan.is_running()? {
                orphan.stop()?;
                output.stderr_line(format_args!(
                    "stopped an embedded broker left behind by a previous run"
                ))?;
            }
            output.stdout_line(format_args!(
                "MMT engine '{}' is not running",
                paths.engine()
            ))?;
        }
        Err(error) => return Err(error.into()),
    }
    Ok(())
}

pub(super) fn status<W: Write, E: Write>(
    config: &Config,
    output: &mut CommandOutput<W, E>,
) -> Result<(), AppError> {
    let paths = EnginePaths::derive(config);
    let supervisor = NodeSupervisor::new(
        system_control(),
        NodeSettings::from_config(config, &paths),
        None,
    );
    if !supervisor.is_running()? {
        output.stdout_line(format_args!(
            "MMT engine '{}' is not running; use 'mmt start' to launch it.",
            paths.engine()
        ))?;
        return Ok(());
    }

    let state = supervisor.state()?.unwrap_or_default();
    output.stdout_line(format_args!("MMT engine '{}' is running", paths.engine()))?;
    output.stdout_line(format_args!("status: {}", state.status()))?;
    for (key, value) in state.entries().filter(|(key, _)| *key != "status") {
        output.stdout_line(format_args!("{key}: {value}"))?;
    }
    Ok(())
}
