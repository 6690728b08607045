use std::num::NonZeroUsize;
use std::process::{Command, Stdio};
use std::thread;

use camino::{Utf8Path, Utf8PathBuf};
use mmt_config::Config;
use tempfile::Builder;
use tracing::info;

use super::TUNING_TARGET;
use super::command::{open_log, run_to_completion};
use super::errors::TuningError;

const OPTIMIZER_ARGUMENTS: &str = "--binary -t random-direction -m 16 --sctype BLEU";
const NBEST_SIZE: &str = "100";
const OUTPUT_FILE: &str = "moses.ini";

/// Inputs of one optimizer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerRequest {
    /// Merged source-side corpus.
    pub source: Utf8PathBuf,
    /// Merged, tokenized reference corpus.
    pub reference: Utf8PathBuf,
    /// Directory owned by the optimizer for this run.
    pub working_dir: Utf8PathBuf,
    /// API port of the node translating on the optimizer's behalf.
    pub api_port: u16,
    /// Whether the node analyses context while translating.
    pub context_analysis: bool,
    /// Whether the optimizer may use non-deterministic seeds.
    pub random_seeds: bool,
    /// Iteration bound; zero leaves the optimizer's default.
    pub max_iterations: u32,
    /// Log receiving the optimizer's output.
    pub log_path: Utf8PathBuf,
}

/// External weight optimizer.
pub trait Optimizer {
    /// Runs the optimizer to completion and returns its configuration file.
    fn optimize(&self, request: &OptimizerRequest) -> Result<Utf8PathBuf, TuningError>;
}

/// Minimum error rate training driven by the Moses `mert-moses.pl` script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MertOptimizer {
    script: Utf8PathBuf,
    interface: Utf8PathBuf,
    bin_dir: Utf8PathBuf,
    threads: usize,
}

impl MertOptimizer {
    /// Creates an optimizer using every available core.
    #[must_use]
    pub fn new(
        script: impl Into<Utf8PathBuf>,
        interface: impl Into<Utf8PathBuf>,
        bin_dir: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            script: script.into(),
            interface: interface.into(),
            bin_dir: bin_dir.into(),
            threads: thread::available_parallelism().map_or(1, NonZeroUsize::get),
        }
    }

    /// Creates an optimizer from the configured script locations.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.optimizer_script(),
            config.optimizer_interface(),
            config.optimizer_bin_dir(),
        )
    }

    /// Overrides the thread count.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Command-line arguments following the script path.
    #[must_use]
    pub fn arguments(&self, request: &OptimizerRequest, runtime_config: &Utf8Path) -> Vec<String> {
        let mut decoder_flags = format!("--port {}", request.api_port);
        if !request.context_analysis {
            decoder_flags.push_str(" --skip-context-analysis 1");
        }
        let mut arguments = vec![
            request.source.to_string(),
            request.reference.to_string(),
            self.interface.to_string(),
            runtime_config.to_string(),
            "--threads".to_owned(),
            self.threads.to_string(),
            "--mertdir".to_owned(),
            self.bin_dir.to_string(),
            "--mertargs".to_owned(),
            OPTIMIZER_ARGUMENTS.to_owned(),
            "--working-dir".to_owned(),
            request.working_dir.to_string(),
            "--nbest".to_owned(),
            NBEST_SIZE.to_owned(),
            "--decoder-flags".to_owned(),
            decoder_flags,
            "--nonorm".to_owned(),
            "--closest".to_owned(),
            "--no-filter-phrase-table".to_owned(),
        ];
        if !request.random_seeds {
            arguments.push("--predictable-seeds".to_owned());
        }
        if request.max_iterations > 0 {
            arguments.push(format!("--maximum-iterations={}", request.max_iterations));
        }
        arguments
    }
}

impl Optimizer for MertOptimizer {
    fn optimize(&self, request: &OptimizerRequest) -> Result<Utf8PathBuf, TuningError> {
        let workspace_error = |source| TuningError::Workspace {
            path: request.working_dir.clone(),
            source,
        };
        std::fs::create_dir_all(&request.working_dir).map_err(workspace_error)?;
        let runtime_config = Builder::new()
            .prefix("runtime-")
            .suffix(".ini")
            .tempfile_in(&request.working_dir)
            .map_err(workspace_error)?;
        let runtime_path = Utf8PathBuf::from_path_buf(runtime_config.path().to_path_buf())
            .map_err(|path| TuningError::NonUtf8Path { path })?;

        let log = open_log(&request.log_path)?;
        let log_err = log.try_clone().map_err(|source| TuningError::OpenLog {
            path: request.log_path.clone(),
            source,
        })?;
        let mut command = Command::new(self.script.as_std_path());
        command
            .args(self.arguments(request, &runtime_path))
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err));
        info!(
            target: TUNING_TARGET,
            script = %self.script,
            threads = self.threads,
            working_dir = %request.working_dir,
            "starting optimizer"
        );
        run_to_completion(&mut command, self.script.as_str(), &request.log_path)?;
        Ok(request.working_dir.join(OUTPUT_FILE))
    }
}
