//! Launching, probing and terminating external programs.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::fs::{File, OpenOptions};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tracing::{debug, info, warn};

use super::PROCESS_TARGET;
use super::errors::ProcessError;

const KILL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Program, arguments and output destination for a launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    program: OsString,
    args: Vec<OsString>,
    log_path: Option<Utf8PathBuf>,
}

impl LaunchSpec {
    /// Starts a spec for `program` with no arguments.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            log_path: None,
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends standard output and standard error to `path`.
    #[must_use]
    pub fn log_to(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Program to execute.
    #[must_use]
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Arguments passed to the program.
    #[must_use]
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    /// Log file receiving the program's output, if any.
    #[must_use]
    pub fn log_path(&self) -> Option<&Utf8Path> {
        self.log_path.as_deref()
    }

    fn display_program(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

/// Operating-system process operations used by the supervisors.
pub trait ProcessControl: Send + Sync {
    /// Launches the program described by `spec` and returns its pid.
    fn spawn(&self, spec: &LaunchSpec) -> Result<u32, ProcessError>;

    /// Reports whether `pid` names a live process.
    fn is_running(&self, pid: u32) -> Result<bool, ProcessError>;

    /// Terminates `pid`.
    ///
    /// A graceful termination request is sent first and liveness is polled
    /// for up to `grace`; a process still alive afterwards is force-killed.
    /// A zero grace force-kills immediately. Killing a process that is
    /// already gone succeeds.
    fn kill(&self, pid: u32, grace: Duration) -> Result<(), ProcessError>;
}

impl<T> ProcessControl for Arc<T>
where
    T: ProcessControl + ?Sized,
{
    fn spawn(&self, spec: &LaunchSpec) -> Result<u32, ProcessError> {
        self.as_ref().spawn(spec)
    }

    fn is_running(&self, pid: u32) -> Result<bool, ProcessError> {
        self.as_ref().is_running(pid)
    }

    fn kill(&self, pid: u32, grace: Duration) -> Result<(), ProcessError> {
        self.as_ref().kill(pid, grace)
    }
}

/// [`ProcessControl`] backed by `std::process` and POSIX signals.
///
/// Children launched through this value are remembered so their exit status
/// can be collected; an exited child would otherwise linger as a zombie and
/// keep answering liveness probes.
#[derive(Debug, Default)]
pub struct SystemProcessControl {
    children: Mutex<HashMap<u32, Child>>,
}

impl SystemProcessControl {
    /// Creates a controller with no tracked children.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn children(&self) -> MutexGuard<'_, HashMap<u32, Child>> {
        self.children.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Collects the exit status of an owned child. `None` means the pid is
    /// not one of ours.
    fn reap(&self, pid: u32) -> Result<Option<bool>, ProcessError> {
        let mut children = self.children();
        let Some(child) = children.get_mut(&pid) else {
            return Ok(None);
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                children.remove(&pid);
                debug!(target: PROCESS_TARGET, pid, %status, "child exited");
                Ok(Some(false))
            }
            Ok(None) => Ok(Some(true)),
            Err(source) => Err(ProcessError::Reap { pid, source }),
        }
    }

    fn wait_for_exit(&self, pid: u32) -> Result<(), ProcessError> {
        let child = self.children().remove(&pid);
        if let Some(mut child) = child {
            child
                .wait()
                .map_err(|source| ProcessError::Reap { pid, source })?;
        }
        Ok(())
    }
}

impl ProcessControl for SystemProcessControl {
    fn spawn(&self, spec: &LaunchSpec) -> Result<u32, ProcessError> {
        let mut command = Command::new(spec.program());
        command.args(spec.arguments()).stdin(Stdio::null());
        match spec.log_path() {
            Some(path) => {
                let stdout = open_log(path)?;
                let stderr = stdout.try_clone().map_err(|source| ProcessError::OpenLog {
                    path: path.to_path_buf(),
                    source,
                })?;
                command.stdout(stdout).stderr(stderr);
            }
            None => {
                command.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }

        let child = command.spawn().map_err(|source| ProcessError::Spawn {
            program: spec.display_program(),
            source,
        })?;
        let pid = child.id();
        if pid == 0 {
            return Err(ProcessError::NonPositivePid {
                program: spec.display_program(),
            });
        }
        info!(
            target: PROCESS_TARGET,
            pid,
            program = %spec.display_program(),
            "process launched"
        );
        self.children().insert(pid, child);
        Ok(pid)
    }

    fn is_running(&self, pid: u32) -> Result<bool, ProcessError> {
        if pid == 0 {
            return Ok(false);
        }
        match self.reap(pid)? {
            Some(alive) => Ok(alive),
            None => check_process(pid),
        }
    }

    fn kill(&self, pid: u32, grace: Duration) -> Result<(), ProcessError> {
        if !self.is_running(pid)? {
            debug!(target: PROCESS_TARGET, pid, "process already gone");
            return Ok(());
        }

        if !grace.is_zero() {
            send_signal(pid, Signal::SIGTERM)?;
            let deadline = Instant::now() + grace;
            while Instant::now() < deadline {
                if !self.is_running(pid)? {
                    info!(target: PROCESS_TARGET, pid, "process terminated");
                    return Ok(());
                }
                thread::sleep(KILL_POLL_INTERVAL);
            }
            warn!(
                target: PROCESS_TARGET,
                pid,
                grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX),
                "process ignored termination request; forcing"
            );
        }

        send_signal(pid, Signal::SIGKILL)?;
        self.wait_for_exit(pid)?;
        info!(target: PROCESS_TARGET, pid, "process killed");
        Ok(())
    }
}

fn open_log(path: &Utf8Path) -> Result<File, ProcessError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| ProcessError::OpenLog {
            path: path.to_path_buf(),
            source,
        })
}

fn to_pid(pid: u32) -> Result<Pid, ProcessError> {
    i32::try_from(pid)
        .map(Pid::from_raw)
        .map_err(|_| ProcessError::PidOutOfRange { pid })
}

fn check_process(pid: u32) -> Result<bool, ProcessError> {
    match kill(to_pid(pid)?, None) {
        Ok(()) | Err(Errno::EPERM) => Ok(true),
        Err(Errno::ESRCH | Errno::ECHILD) => Ok(false),
        Err(source) => Err(ProcessError::CheckProcess { pid, source }),
    }
}

fn send_signal(pid: u32, signal: Signal) -> Result<(), ProcessError> {
    match kill(to_pid(pid)?, signal) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(source) => Err(ProcessError::Signal {
            pid,
            signal,
            source,
        }),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;

    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    #[fixture]
    fn control() -> SystemProcessControl {
        SystemProcessControl::new()
    }

    fn sleeper() -> LaunchSpec {
        LaunchSpec::new("sleep").arg("30")
    }

    #[rstest]
    fn launched_process_is_running_until_killed(control: SystemProcessControl) {
        let pid = control.spawn(&sleeper()).expect("spawn sleep");
        assert!(control.is_running(pid).expect("probe"));
        control.kill(pid, Duration::ZERO).expect("kill");
        assert!(!control.is_running(pid).expect("probe"));
    }

    #[rstest]
    fn graceful_kill_terminates_cooperative_process(control: SystemProcessControl) {
        let pid = control.spawn(&sleeper()).expect("spawn sleep");
        let started = Instant::now();
        control
            .kill(pid, Duration::from_secs(5))
            .expect("graceful kill");
        assert!(!control.is_running(pid).expect("probe"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[rstest]
    fn graceful_kill_escalates_when_term_is_ignored(control: SystemProcessControl) {
        let spec = LaunchSpec::new("/bin/sh")
            .arg("-c")
            .arg("trap '' TERM; sleep 30");
        let pid = control.spawn(&spec).expect("spawn stubborn shell");
        thread::sleep(Duration::from_millis(200));
        control
            .kill(pid, Duration::from_millis(300))
            .expect("forced kill");
        assert!(!control.is_running(pid).expect("probe"));
    }

    #[rstest]
    fn exited_children_are_not_running(control: SystemProcessControl) {
        let pid = control.spawn(&LaunchSpec::new("true")).expect("spawn true");
        let deadline = Instant::now() + Duration::from_secs(5);
        while control.is_running(pid).expect("probe") {
            assert!(Instant::now() < deadline, "child never exited");
            thread::sleep(Duration::from_millis(20));
        }
    }

    #[rstest]
    fn killing_a_dead_process_succeeds(control: SystemProcessControl) {
        let pid = control.spawn(&LaunchSpec::new("true")).expect("spawn true");
        thread::sleep(Duration::from_millis(200));
        control.kill(pid, Duration::from_secs(1)).expect("kill");
    }

    #[rstest]
    fn output_is_appended_to_the_log(control: SystemProcessControl) {
        let dir = TempDir::new().expect("temp dir");
        let log = Utf8Path::from_path(dir.path())
            .expect("utf8 temp dir")
            .join("out.log");
        fs::write(&log, "first\n").expect("seed log");
        let spec = LaunchSpec::new("/bin/sh")
            .args(["-c", "echo second"])
            .log_to(&log);
        let pid = control.spawn(&spec).expect("spawn echo");
        control.wait_for_exit(pid).expect("wait");
        assert_eq!(fs::read_to_string(&log).expect("read log"), "first\nsecond\n");
    }

    #[rstest]
    fn missing_programs_fail_to_spawn(control: SystemProcessControl) {
        let error = control
            .spawn(&LaunchSpec::new("/nonexistent/mmt-node"))
            .expect_err("spawn should fail");
        assert_eq!(error.kind(), crate::ErrorKind::Subprocess);
    }

    #[rstest]
    fn pid_zero_is_never_running(control: SystemProcessControl) {
        assert!(!control.is_running(0).expect("probe"));
    }
}
