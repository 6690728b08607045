//! Progress reporting for tuning runs.

use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use strum::{Display, EnumCount, EnumIter};
use tracing::{info, warn};

use super::TUNING_TARGET;
use super::corpus::LanguagePair;
use super::output::TuningResult;

/// Stages of a tuning run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumCount, EnumIter)]
pub enum TuningStage {
    /// Tokenization of the reference corpora.
    #[strum(serialize = "Corpora tokenization")]
    Tokenization,
    /// Concatenation of each side into one file.
    #[strum(serialize = "Merging corpus")]
    Merge,
    /// The optimizer run.
    #[strum(serialize = "Tuning")]
    Optimization,
    /// Parsing and pushing the optimized weights.
    #[strum(serialize = "Applying changes")]
    Apply,
}

impl TuningStage {
    /// One-based position of the stage.
    #[must_use]
    pub const fn position(self) -> usize {
        match self {
            Self::Tokenization => 1,
            Self::Merge => 2,
            Self::Optimization => 3,
            Self::Apply => 4,
        }
    }

    /// Number of stages in a run.
    #[must_use]
    pub const fn total() -> usize {
        Self::COUNT
    }
}

/// Summary printed when a run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuningBanner {
    /// Engine being tuned.
    pub engine: String,
    /// Folder the corpora were listed from, when known.
    pub corpora_dir: Option<Utf8PathBuf>,
    /// Number of corpora.
    pub corpus_count: usize,
    /// Engine language pair.
    pub languages: LanguagePair,
    /// API port of the node being tuned.
    pub api_port: u16,
}

/// Observer of a tuning run.
pub trait TuningReporter {
    /// The run passed its preconditions.
    fn started(&self, banner: &TuningBanner);

    /// A stage begins.
    fn stage_started(&self, stage: TuningStage);

    /// A stage completed.
    fn stage_finished(&self, stage: TuningStage, elapsed: Duration);

    /// A stage failed; the run stops.
    fn stage_failed(&self, _stage: TuningStage, _elapsed: Duration) {}

    /// The weights reached the node.
    fn completed(&self, banner: &TuningBanner, result: &TuningResult);
}

impl<T: TuningReporter + ?Sized> TuningReporter for Arc<T> {
    fn started(&self, banner: &TuningBanner) {
        (**self).started(banner);
    }

    fn stage_started(&self, stage: TuningStage) {
        (**self).stage_started(stage);
    }

    fn stage_finished(&self, stage: TuningStage, elapsed: Duration) {
        (**self).stage_finished(stage, elapsed);
    }

    fn stage_failed(&self, stage: TuningStage, elapsed: Duration) {
        (**self).stage_failed(stage, elapsed);
    }

    fn completed(&self, banner: &TuningBanner, result: &TuningResult) {
        (**self).completed(banner, result);
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Reporter emitting structured tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredTuningReporter;

impl TuningReporter for StructuredTuningReporter {
    fn started(&self, banner: &TuningBanner) {
        info!(
            target: TUNING_TARGET,
            engine = %banner.engine,
            corpora = banner.corpus_count,
            languages = %banner.languages,
            "tuning started"
        );
    }

    fn stage_started(&self, stage: TuningStage) {
        info!(
            target: TUNING_TARGET,
            stage = %stage,
            position = stage.position(),
            total = TuningStage::total(),
            "stage started"
        );
    }

    fn stage_finished(&self, stage: TuningStage, elapsed: Duration) {
        info!(
            target: TUNING_TARGET,
            stage = %stage,
            elapsed_ms = millis(elapsed),
            "stage finished"
        );
    }

    fn stage_failed(&self, stage: TuningStage, elapsed: Duration) {
        warn!(
            target: TUNING_TARGET,
            stage = %stage,
            elapsed_ms = millis(elapsed),
            "stage failed"
        );
    }

    fn completed(&self, banner: &TuningBanner, result: &TuningResult) {
        info!(
            target: TUNING_TARGET,
            engine = %banner.engine,
            bleu = result.bleu,
            features = result.weights.len(),
            "tuning succeeded"
        );
    }
}
