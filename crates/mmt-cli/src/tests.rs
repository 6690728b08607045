//! Behavioural tests for the command runtime.

use super::*;

use std::cell::RefCell;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

use anyhow::{Context, Result, anyhow};
use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

type StepResult = Result<(), String>;

struct StaticConfigLoader {
    config: Config,
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

struct CliWorld {
    dir: TempDir,
    config: Config,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exit_code: Option<ExitCode>,
    node_api: Option<thread::JoinHandle<Result<()>>>,
}

impl CliWorld {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        Self {
            dir,
            config: Config::default(),
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: None,
            node_api: None,
        }
    }

    fn root(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().to_path_buf()).expect("utf8 temp dir")
    }

    fn configure_engine(&mut self, engine: &str) {
        let root = self.root();
        self.config = Config {
            engine: Some(engine.to_owned()),
            engines_dir: Some(root.join("engines").into_string()),
            runtime_dir: Some(root.join("runtime").into_string()),
            ..Config::default()
        };
    }

    fn paths(&self) -> mmt_config::EnginePaths {
        mmt_config::EnginePaths::derive(&self.config)
    }

    fn run(&mut self, command: &str) -> Result<()> {
        self.stdout.clear();
        self.stderr.clear();
        let args = std::iter::once(OsString::from("mmt"))
            .chain(command.split_whitespace().map(OsString::from))
            .collect::<Vec<_>>();
        let loader = StaticConfigLoader {
            config: self.config.clone(),
        };
        let exit = run_with_loader(args, &mut self.stdout, &mut self.stderr, &loader);
        self.exit_code = Some(exit);
        if let Some(handle) = self.node_api.take() {
            handle
                .join()
                .map_err(|_| anyhow!("fake node API thread panicked"))?
                .context("fake node API failed")?;
        }
        Ok(())
    }

    fn stdout_text(&self) -> String {
        String::from_utf8(self.stdout.clone()).expect("stdout utf8")
    }

    fn stderr_text(&self) -> String {
        String::from_utf8(self.stderr.clone()).expect("stderr utf8")
    }
}

/// Answers exactly one HTTP request with `body` and returns the bound port.
fn serve_once(body: String) -> Result<(u16, thread::JoinHandle<Result<()>>)> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake node API")?;
    let port = listener.local_addr().context("read fake node API address")?.port();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().context("accept request")?;
        let mut reader = BufReader::new(stream.try_clone().context("clone stream")?);
        let mut line = String::new();
        while reader.read_line(&mut line).context("read request")? > 0 {
            if line == "\r\n" {
                break;
            }
            line.clear();
        }
        write!(
            stream,
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .context("write response")
    });
    Ok((port, handle))
}

#[fixture]
fn world() -> RefCell<CliWorld> {
    RefCell::new(CliWorld::new())
}

#[given("an engine \"{engine}\"")]
fn given_engine(world: &RefCell<CliWorld>, engine: String) {
    world.borrow_mut().configure_engine(&engine);
}

#[given("the engine translates \"{source}\" into \"{target}\"")]
fn given_language_pair(world: &RefCell<CliWorld>, source: String, target: String) {
    let mut current = world.borrow_mut();
    current.config.source_language = Some(source);
    current.config.target_language = Some(target);
}

#[given("an empty development corpora folder")]
fn given_empty_corpora(world: &RefCell<CliWorld>) -> StepResult {
    let dev = world.borrow().paths().dev_corpora_dir();
    fs::create_dir_all(&dev).map_err(|error| error.to_string())
}

#[given("a live node publishing status \"{status}\"")]
fn given_live_node(world: &RefCell<CliWorld>, status: String) -> StepResult {
    let paths = world.borrow().paths();
    fs::create_dir_all(paths.runtime_dir()).map_err(|error| error.to_string())?;
    fs::write(paths.node_pid_path(), std::process::id().to_string())
        .map_err(|error| error.to_string())?;
    fs::write(
        paths.node_status_path(),
        format!("# published by the node\nstatus={status}\nuuid=5b1c\n"),
    )
    .map_err(|error| error.to_string())
}

#[given("a node API answering with translation \"{translation}\"")]
fn given_node_api(world: &RefCell<CliWorld>, translation: String) -> StepResult {
    let body = format!(r#"{{"status":200,"data":{{"translation":"{translation}"}}}}"#);
    let (port, handle) = serve_once(body).map_err(|error| format!("{error:#}"))?;
    let mut current = world.borrow_mut();
    current.config.api_port = Some(port);
    current.node_api = Some(handle);
    Ok(())
}

#[given("a node API that refuses connections")]
fn given_unreachable_api(world: &RefCell<CliWorld>) {
    let port = TcpListener::bind(("127.0.0.1", 0))
        .and_then(|listener| listener.local_addr())
        .expect("reserve a port")
        .port();
    world.borrow_mut().config.api_port = Some(port);
}

#[when("the operator runs \"{command}\"")]
fn when_operator_runs(world: &RefCell<CliWorld>, command: String) -> StepResult {
    world
        .borrow_mut()
        .run(&command)
        .map_err(|error| format!("{error:#}"))
}

#[then("the CLI succeeds")]
fn then_success(world: &RefCell<CliWorld>) -> StepResult {
    let current = world.borrow();
    if current.exit_code == Some(ExitCode::SUCCESS) {
        Ok(())
    } else {
        Err(format!(
            "expected success, stderr was: {}",
            current.stderr_text()
        ))
    }
}

#[then("the CLI fails")]
fn then_failure(world: &RefCell<CliWorld>) {
    assert_eq!(world.borrow().exit_code, Some(ExitCode::FAILURE));
}

#[then("stdout contains \"{snippet}\"")]
fn then_stdout_contains(world: &RefCell<CliWorld>, snippet: String) {
    let stdout = world.borrow().stdout_text();
    assert!(stdout.contains(&snippet), "stdout was: {stdout}");
}

#[then("stderr contains \"{snippet}\"")]
fn then_stderr_contains(world: &RefCell<CliWorld>, snippet: String) {
    let stderr = world.borrow().stderr_text();
    assert!(stderr.contains(&snippet), "stderr was: {stderr}");
}

#[scenario(path = "tests/features/cli_commands.feature")]
fn cli_commands(#[from(world)] _: RefCell<CliWorld>) -> Result<(), String> {
    Ok(())
}
