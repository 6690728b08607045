//! Doubles shared by the behavioural suites.

mod coordination;
mod process;
mod tuning;

pub(crate) use coordination::CoordinationStub;
pub(crate) use process::{FakeProcessControl, ProcessEvent};
pub(crate) use tuning::{
    CopyTokenizer, FakeNode, RecordingFeatures, RecordingReporter, ScriptedOptimizer,
};

use camino::Utf8PathBuf;
use tempfile::TempDir;

/// UTF-8 view of a temporary directory.
pub(crate) fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("temp dir should be UTF-8")
}
