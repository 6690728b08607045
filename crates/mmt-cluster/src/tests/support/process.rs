//! In-memory process table standing in for the operating system.

use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use nix::errno::Errno;

use crate::broker::BROKER_READY_MARKER;
use crate::process::{LaunchSpec, ProcessControl, ProcessError};

/// Something the fake observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProcessEvent {
    Spawned { pid: u32, program: String },
    Killed { pid: u32, grace: Duration },
}

#[derive(Default)]
struct Table {
    next_pid: u32,
    alive: BTreeSet<u32>,
    events: Vec<ProcessEvent>,
}

/// Simulated processes. Broker launches log the readiness marker unless
/// told otherwise; programs listed in `dead_on_arrival` exit immediately and
/// liveness checks of programs listed in `unobservable` fail.
pub(crate) struct FakeProcessControl {
    table: Mutex<Table>,
    broker_reports_ready: bool,
    dead_on_arrival: Vec<String>,
    unobservable: Vec<String>,
}

impl Default for FakeProcessControl {
    fn default() -> Self {
        Self {
            table: Mutex::new(Table {
                next_pid: 1000,
                ..Table::default()
            }),
            broker_reports_ready: true,
            dead_on_arrival: Vec::new(),
            unobservable: Vec::new(),
        }
    }
}

impl FakeProcessControl {
    pub(crate) fn silent_broker(mut self) -> Self {
        self.broker_reports_ready = false;
        self
    }

    pub(crate) fn dead_on_arrival(mut self, program: &str) -> Self {
        self.dead_on_arrival.push(program.to_owned());
        self
    }

    pub(crate) fn unobservable(mut self, program: &str) -> Self {
        self.unobservable.push(program.to_owned());
        self
    }

    pub(crate) fn events(&self) -> Vec<ProcessEvent> {
        self.table.lock().expect("process table lock").events.clone()
    }

    pub(crate) fn spawned_programs(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProcessEvent::Spawned { program, .. } => Some(program),
                ProcessEvent::Killed { .. } => None,
            })
            .collect()
    }

    pub(crate) fn pid_of(&self, program: &str) -> Option<u32> {
        self.events().into_iter().rev().find_map(|event| match event {
            ProcessEvent::Spawned { pid, program: name } if name == program => Some(pid),
            _ => None,
        })
    }

    pub(crate) fn kills(&self) -> Vec<(u32, Duration)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProcessEvent::Killed { pid, grace } => Some((pid, grace)),
                ProcessEvent::Spawned { .. } => None,
            })
            .collect()
    }

    pub(crate) fn crash(&self, pid: u32) {
        self.table.lock().expect("process table lock").alive.remove(&pid);
    }
}

impl ProcessControl for FakeProcessControl {
    fn spawn(&self, spec: &LaunchSpec) -> Result<u32, ProcessError> {
        let program = Path::new(spec.program())
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut table = self.table.lock().expect("process table lock");
        table.next_pid += 1;
        let pid = table.next_pid;
        if !self.dead_on_arrival.contains(&program) {
            table.alive.insert(pid);
        }
        if program == "kafka-server-start.sh"
            && self.broker_reports_ready
            && let Some(log) = spec.log_path()
        {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log)
                .expect("broker log should open");
            writeln!(file, "[2026-01-01 00:00:00,000] {BROKER_READY_MARKER}")
                .expect("broker log should accept the marker");
        }
        table.events.push(ProcessEvent::Spawned { pid, program });
        Ok(pid)
    }

    fn is_running(&self, pid: u32) -> Result<bool, ProcessError> {
        let table = self.table.lock().expect("process table lock");
        let unobservable = table.events.iter().any(|event| {
            matches!(event, ProcessEvent::Spawned { pid: spawned, program }
                if *spawned == pid && self.unobservable.contains(program))
        });
        if unobservable {
            return Err(ProcessError::CheckProcess {
                pid,
                source: Errno::EPERM,
            });
        }
        Ok(table.alive.contains(&pid))
    }

    fn kill(&self, pid: u32, grace: Duration) -> Result<(), ProcessError> {
        let mut table = self.table.lock().expect("process table lock");
        table.alive.remove(&pid);
        table.events.push(ProcessEvent::Killed { pid, grace });
        Ok(())
    }
}
