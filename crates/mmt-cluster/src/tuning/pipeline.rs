use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use super::TUNING_TARGET;
use super::corpus::{BilingualCorpus, LanguagePair};
use super::errors::TuningError;
use super::optimizer::{Optimizer, OptimizerRequest};
use super::output::{TuningResult, parse_optimizer_output};
use super::reporter::{TuningBanner, TuningReporter, TuningStage};
use super::tokenizer::Tokenizer;
use super::workspace::TuningWorkspace;
use crate::api::DecoderFeatures;
use crate::node::NodeLiveness;

const DEFAULT_MAX_ITERATIONS: u32 = 25;
const OPTIMIZER_LOG: &str = "mert.log";

/// Per-run switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuningOptions {
    /// Let the node analyse context while the optimizer translates.
    pub context_analysis: bool,
    /// Allow non-deterministic optimizer seeds.
    pub random_seeds: bool,
    /// Optimizer iteration bound; zero removes it.
    pub max_iterations: u32,
    /// Keep the working directory after the run.
    pub debug: bool,
}

impl Default for TuningOptions {
    fn default() -> Self {
        Self {
            context_analysis: true,
            random_seeds: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            debug: false,
        }
    }
}

/// Engine facts a run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuningSettings {
    /// Engine name, shown in the banner.
    pub engine: String,
    /// Engine language pair.
    pub languages: LanguagePair,
    /// Parent of the run's working directory.
    pub temp_dir: Utf8PathBuf,
    /// Directory receiving the optimizer log.
    pub logs_dir: Utf8PathBuf,
}

impl TuningSettings {
    /// Working directory owned by a run.
    #[must_use]
    pub fn working_dir(&self) -> Utf8PathBuf {
        self.temp_dir.join("tuning")
    }

    /// Log receiving the optimizer's output.
    #[must_use]
    pub fn optimizer_log(&self) -> Utf8PathBuf {
        self.logs_dir.join(OPTIMIZER_LOG)
    }
}

/// External parties a run talks to.
#[derive(Clone, Copy)]
pub struct TuningCollaborators<'a> {
    /// Node whose liveness gates the run.
    pub node: &'a dyn NodeLiveness,
    /// Receiver of the optimized weights.
    pub features: &'a dyn DecoderFeatures,
    /// Reference corpus tokenizer.
    pub tokenizer: &'a dyn Tokenizer,
    /// Weight optimizer.
    pub optimizer: &'a dyn Optimizer,
    /// Progress observer.
    pub reporter: &'a dyn TuningReporter,
}

/// Four-stage tuning run against a live node.
pub struct TuningPipeline<'a> {
    settings: TuningSettings,
    collaborators: TuningCollaborators<'a>,
}

impl<'a> TuningPipeline<'a> {
    /// Creates a pipeline.
    #[must_use]
    pub const fn new(settings: TuningSettings, collaborators: TuningCollaborators<'a>) -> Self {
        Self {
            settings,
            collaborators,
        }
    }

    /// Engine facts used by the pipeline.
    #[must_use]
    pub const fn settings(&self) -> &TuningSettings {
        &self.settings
    }

    /// Tunes the node on `corpora` and pushes the optimized weights.
    ///
    /// `corpora_dir` only feeds the banner. The working directory is removed
    /// on every exit path unless `options.debug` is set.
    ///
    /// # Errors
    ///
    /// Fails with [`TuningError::EmptyCorpora`] before anything else when no
    /// corpora are given, and with [`TuningError::NoServerRunning`] when the
    /// node is down. Stage failures propagate unchanged.
    pub fn run(
        &self,
        corpora: &[BilingualCorpus],
        corpora_dir: Option<&Utf8Path>,
        options: TuningOptions,
    ) -> Result<TuningResult, TuningError> {
        if corpora.is_empty() {
            return Err(TuningError::EmptyCorpora);
        }
        let node = self.collaborators.node;
        if !node.is_running()? {
            return Err(TuningError::NoServerRunning);
        }

        let languages = &self.settings.languages;
        let source_corpora: Vec<BilingualCorpus> = corpora
            .iter()
            .map(|corpus| corpus.with_languages([languages.source.as_str()]))
            .collect();
        let reference_corpora: Vec<BilingualCorpus> = corpora
            .iter()
            .map(|corpus| corpus.with_languages([languages.target.as_str()]))
            .collect();

        let banner = TuningBanner {
            engine: self.settings.engine.clone(),
            corpora_dir: corpora_dir.map(Utf8Path::to_owned),
            corpus_count: corpora.len(),
            languages: languages.clone(),
            api_port: node.api_port(),
        };
        let reporter = self.collaborators.reporter;
        reporter.started(&banner);

        let workspace = TuningWorkspace::create(self.settings.working_dir(), options.debug)?;

        let tokenized = self.stage(TuningStage::Tokenization, || {
            self.collaborators
                .tokenizer
                .process_corpora(&reference_corpora, &workspace.reference_dir())
        })?;

        let (merged_source, merged_reference) = self.stage(TuningStage::Merge, || {
            let source_file = workspace.merged_corpus(&languages.source);
            let reference_file = workspace.merged_corpus(&languages.target);
            merge(
                source_corpora.iter().map(|corpus| corpus.file(&languages.source)),
                &source_file,
            )?;
            merge(
                tokenized.iter().map(|corpus| corpus.file(&languages.target)),
                &reference_file,
            )?;
            Ok((source_file, reference_file))
        })?;

        let request = OptimizerRequest {
            source: merged_source,
            reference: merged_reference,
            working_dir: workspace.optimizer_dir(),
            api_port: banner.api_port,
            context_analysis: options.context_analysis,
            random_seeds: options.random_seeds,
            max_iterations: options.max_iterations,
            log_path: self.settings.optimizer_log(),
        };
        let output = self.stage(TuningStage::Optimization, || {
            self.collaborators.optimizer.optimize(&request)
        })?;

        let result = self.stage(TuningStage::Apply, || {
            let content = fs::read_to_string(&output).map_err(|source| TuningError::ReadOutput {
                path: output.clone(),
                source,
            })?;
            let parsed = parse_optimizer_output(&content).map_err(|source| {
                TuningError::ParseOutput {
                    path: output.clone(),
                    source,
                }
            })?;
            self.collaborators.features.update_features(&parsed.weights)?;
            Ok(parsed)
        })?;

        info!(
            target: TUNING_TARGET,
            bleu = result.bleu,
            features = result.weights.len(),
            "applied optimized weights"
        );
        reporter.completed(&banner, &result);
        Ok(result)
    }

    fn stage<T>(
        &self,
        stage: TuningStage,
        work: impl FnOnce() -> Result<T, TuningError>,
    ) -> Result<T, TuningError> {
        let reporter = self.collaborators.reporter;
        reporter.stage_started(stage);
        let started = Instant::now();
        let outcome = work();
        match &outcome {
            Ok(_) => reporter.stage_finished(stage, started.elapsed()),
            Err(_) => reporter.stage_failed(stage, started.elapsed()),
        }
        outcome
    }
}

/// Concatenates `inputs` into `destination`, ending every input on a newline.
fn merge(
    inputs: impl IntoIterator<Item = Utf8PathBuf>,
    destination: &Utf8Path,
) -> Result<(), TuningError> {
    let merge_error = |source| TuningError::Merge {
        path: destination.to_owned(),
        source,
    };
    let file = File::create(destination).map_err(merge_error)?;
    let mut writer = BufWriter::new(file);
    for input in inputs {
        let content = fs::read(&input).map_err(|source| TuningError::CorpusFile {
            path: input.clone(),
            source,
        })?;
        writer.write_all(&content).map_err(merge_error)?;
        if content.last().is_some_and(|byte| *byte != b'\n') {
            writer.write_all(b"\n").map_err(merge_error)?;
        }
    }
    writer.flush().map_err(merge_error)?;
    Ok(())
}
