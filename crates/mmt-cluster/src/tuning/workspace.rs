use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use super::TUNING_TARGET;
use super::errors::TuningError;

const REFERENCE_DIR: &str = "reference_corpora";
const OPTIMIZER_DIR: &str = "mert";

/// Scoped working directory of one tuning run.
///
/// Dropping the guard removes the directory unless it was created with
/// `keep` set, which leaves it behind for inspection.
#[derive(Debug)]
pub struct TuningWorkspace {
    root: Utf8PathBuf,
    keep: bool,
}

impl TuningWorkspace {
    /// Recreates `path` empty, with its reference and optimizer folders.
    pub fn create(path: impl Into<Utf8PathBuf>, keep: bool) -> Result<Self, TuningError> {
        let root = path.into();
        let error = |source| TuningError::Workspace {
            path: root.clone(),
            source,
        };
        match fs::remove_dir_all(&root) {
            Err(source) if source.kind() != io::ErrorKind::NotFound => return Err(error(source)),
            _ => {}
        }
        fs::create_dir_all(root.join(REFERENCE_DIR)).map_err(error)?;
        fs::create_dir_all(root.join(OPTIMIZER_DIR)).map_err(error)?;
        debug!(target: TUNING_TARGET, dir = %root, keep, "created tuning workspace");
        Ok(Self { root, keep })
    }

    /// Root of the workspace.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Folder receiving tokenized reference corpora.
    #[must_use]
    pub fn reference_dir(&self) -> Utf8PathBuf {
        self.root.join(REFERENCE_DIR)
    }

    /// Folder owned by the optimizer.
    #[must_use]
    pub fn optimizer_dir(&self) -> Utf8PathBuf {
        self.root.join(OPTIMIZER_DIR)
    }

    /// Merged corpus file for `language`.
    #[must_use]
    pub fn merged_corpus(&self, language: &str) -> Utf8PathBuf {
        self.root.join(format!("corpus.{language}"))
    }
}

impl Drop for TuningWorkspace {
    fn drop(&mut self) {
        if self.keep {
            debug!(target: TUNING_TARGET, dir = %self.root, "keeping tuning workspace");
            return;
        }
        if let Err(error) = fs::remove_dir_all(&self.root)
            && error.kind() != io::ErrorKind::NotFound
        {
            warn!(
                target: TUNING_TARGET,
                dir = %self.root,
                error = %error,
                "failed to remove tuning workspace"
            );
        }
    }
}
