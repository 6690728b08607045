//! Collaborator doubles for tuning runs.

use std::fs;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};

use crate::api::{ApiError, DecoderFeatures, FeatureWeights};
use crate::node::{NodeError, NodeLiveness};
use crate::tuning::{
    BilingualCorpus, Optimizer, OptimizerRequest, Tokenizer, TuningBanner, TuningError,
    TuningReporter, TuningResult, TuningStage,
};

/// Node with a fixed liveness answer.
pub(crate) struct FakeNode {
    pub(crate) running: AtomicBool,
    pub(crate) port: u16,
    pub(crate) checks: AtomicUsize,
}

impl FakeNode {
    pub(crate) fn new(running: bool) -> Self {
        Self {
            running: AtomicBool::new(running),
            port: 8045,
            checks: AtomicUsize::new(0),
        }
    }
}

impl NodeLiveness for FakeNode {
    fn is_running(&self) -> Result<bool, NodeError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.running.load(Ordering::SeqCst))
    }

    fn api_port(&self) -> u16 {
        self.port
    }
}

/// Remembers every weight update.
#[derive(Default)]
pub(crate) struct RecordingFeatures {
    pub(crate) pushes: Mutex<Vec<FeatureWeights>>,
}

impl RecordingFeatures {
    pub(crate) fn pushes(&self) -> Vec<FeatureWeights> {
        self.pushes.lock().expect("pushes lock").clone()
    }
}

impl DecoderFeatures for RecordingFeatures {
    fn update_features(&self, weights: &FeatureWeights) -> Result<(), ApiError> {
        self.pushes.lock().expect("pushes lock").push(weights.clone());
        Ok(())
    }
}

/// Lower-cases corpus files into the output folder.
#[derive(Default)]
pub(crate) struct CopyTokenizer {
    pub(crate) calls: AtomicUsize,
}

impl Tokenizer for CopyTokenizer {
    fn process_corpora(
        &self,
        corpora: &[BilingualCorpus],
        output: &Utf8Path,
    ) -> Result<Vec<BilingualCorpus>, TuningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut relocated = Vec::new();
        for corpus in corpora {
            let moved = corpus.relocated(output);
            for language in corpus.languages() {
                let content = fs::read_to_string(corpus.file(language)).expect("read corpus");
                fs::write(moved.file(language), content.to_lowercase()).expect("write corpus");
            }
            relocated.push(moved);
        }
        Ok(relocated)
    }
}

/// Writes a canned configuration file, or fails like a crashed optimizer.
pub(crate) struct ScriptedOptimizer {
    pub(crate) output: Option<String>,
    pub(crate) requests: Mutex<Vec<OptimizerRequest>>,
    pub(crate) merged: Mutex<Vec<(String, String)>>,
}

impl ScriptedOptimizer {
    pub(crate) fn writing(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            requests: Mutex::new(Vec::new()),
            merged: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            output: None,
            requests: Mutex::new(Vec::new()),
            merged: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<OptimizerRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub(crate) fn merged(&self) -> Vec<(String, String)> {
        self.merged.lock().expect("merged lock").clone()
    }
}

impl Optimizer for ScriptedOptimizer {
    fn optimize(&self, request: &OptimizerRequest) -> Result<Utf8PathBuf, TuningError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        self.merged.lock().expect("merged lock").push((
            fs::read_to_string(&request.source).expect("read merged source"),
            fs::read_to_string(&request.reference).expect("read merged reference"),
        ));
        let Some(output) = &self.output else {
            return Err(TuningError::Subprocess {
                program: "mert-moses.pl".into(),
                code: Some(1),
                log: request.log_path.clone(),
            });
        };
        let path = request.working_dir.join("moses.ini");
        fs::write(&path, output).expect("write optimizer output");
        Ok(path)
    }
}

/// Reporter keeping a readable trace of events.
#[derive(Default)]
pub(crate) struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }

    fn record(&self, event: String) {
        self.events.lock().expect("events lock").push(event);
    }
}

impl TuningReporter for RecordingReporter {
    fn started(&self, banner: &TuningBanner) {
        self.record(format!(
            "started {} ({} corpora, {})",
            banner.engine, banner.corpus_count, banner.languages
        ));
    }

    fn stage_started(&self, stage: TuningStage) {
        self.record(format!("begin {}", stage.position()));
    }

    fn stage_finished(&self, stage: TuningStage, _elapsed: Duration) {
        self.record(format!("done {}", stage.position()));
    }

    fn stage_failed(&self, stage: TuningStage, _elapsed: Duration) {
        self.record(format!("failed {}", stage.position()));
    }

    fn completed(&self, _banner: &TuningBanner, result: &TuningResult) {
        self.record(format!("completed {:.4}", result.bleu));
    }
}
