//! Derives the on-disk layout of an engine and its runtime artefacts.
//!
//! The supervisor, the tuning pipeline and the CLI all need to agree on where
//! pid files, status files, logs and working directories live. The layout is
//! computed once from [`Config`] and handed around by reference.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::Config;

/// Canonical paths for an engine's models, data and runtime artefacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnginePaths {
    engine: String,
    engine_root: Utf8PathBuf,
    models_dir: Utf8PathBuf,
    data_dir: Utf8PathBuf,
    runtime_dir: Utf8PathBuf,
    logs_dir: Utf8PathBuf,
    temp_dir: Utf8PathBuf,
}

impl EnginePaths {
    /// Computes the layout without touching the filesystem.
    #[must_use]
    pub fn derive(config: &Config) -> Self {
        let engine = config.engine().to_owned();
        let engine_root = config.engines_dir().join(&engine);
        let runtime_dir = config.runtime_dir().join(&engine);
        Self {
            models_dir: engine_root.join("models"),
            data_dir: engine_root.join("data"),
            logs_dir: runtime_dir.join("logs"),
            temp_dir: runtime_dir.join("tmp"),
            engine,
            engine_root,
            runtime_dir,
        }
    }

    /// Computes the layout and creates the runtime and log directories.
    pub fn prepare(config: &Config) -> Result<Self, EnginePathsError> {
        let paths = Self::derive(config);
        for dir in [&paths.runtime_dir, &paths.logs_dir, &paths.temp_dir] {
            fs::create_dir_all(dir).map_err(|source| EnginePathsError::CreateDirectory {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(paths)
    }

    /// Engine name.
    #[must_use]
    pub fn engine(&self) -> &str {
        &self.engine
    }

    /// Engine root directory.
    #[must_use]
    pub fn engine_root(&self) -> &Utf8Path {
        &self.engine_root
    }

    /// Directory holding engine models.
    #[must_use]
    pub fn models_dir(&self) -> &Utf8Path {
        &self.models_dir
    }

    /// Directory holding engine data.
    #[must_use]
    pub fn data_dir(&self) -> &Utf8Path {
        &self.data_dir
    }

    /// Default folder of development corpora used for tuning.
    #[must_use]
    pub fn dev_corpora_dir(&self) -> Utf8PathBuf {
        self.data_dir.join("dev")
    }

    /// Per-engine runtime directory.
    #[must_use]
    pub fn runtime_dir(&self) -> &Utf8Path {
        &self.runtime_dir
    }

    /// Directory receiving process logs.
    #[must_use]
    pub fn logs_dir(&self) -> &Utf8Path {
        &self.logs_dir
    }

    /// Scratch directory for tuning runs.
    #[must_use]
    pub fn temp_dir(&self) -> &Utf8Path {
        &self.temp_dir
    }

    /// Pid file of the cluster node.
    #[must_use]
    pub fn node_pid_path(&self) -> Utf8PathBuf {
        self.runtime_dir.join("node.pid")
    }

    /// Status file published by the cluster node.
    #[must_use]
    pub fn node_status_path(&self) -> Utf8PathBuf {
        self.runtime_dir.join("node.status")
    }

    /// Log file capturing the node's output.
    #[must_use]
    pub fn node_log_path(&self) -> Utf8PathBuf {
        self.logs_dir.join("mmt-node.log")
    }

    /// Pid file recording the broker and coordination service pair.
    #[must_use]
    pub fn broker_pid_path(&self) -> Utf8PathBuf {
        self.runtime_dir.join("kafka.pid")
    }

    /// Data directory of the embedded broker pair.
    #[must_use]
    pub fn broker_data_dir(&self) -> Utf8PathBuf {
        self.models_dir.join("kafka")
    }

    /// Log file shared by the broker and coordination service.
    #[must_use]
    pub fn broker_log_path(&self) -> Utf8PathBuf {
        self.logs_dir.join("embedded-kafka.log")
    }
}

/// Errors raised while preparing engine directories.
#[derive(Debug, Error)]
pub enum EnginePathsError {
    /// Creating a runtime directory failed.
    #[error("failed to prepare directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}
