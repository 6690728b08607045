//! Supervision of a ModernMT cluster node and its tuning pipeline.
//!
//! The node itself, the embedded message broker and the tuning optimizer are
//! external programs. This crate launches them, tracks them through pid files,
//! polls the status file the node publishes, and talks to the node's REST API.
//!
//! The layers build on each other:
//!
//! - [`process`] launches, probes and kills operating-system processes and
//!   persists their pids.
//! - [`broker`] bootstraps the coordination service and message broker pair a
//!   leader node depends on.
//! - [`node`] owns the node process and its monotonic [`NodeStatus`].
//! - [`api`] wraps the node's REST surface.
//! - [`tuning`] drives corpus preparation, the optimizer and the weight
//!   update.
//! - [`translate`] runs interactive and batch translation against the API.
//!
//! Every error type exposes [`ErrorKind`] through a `kind()` method so callers
//! can react to the failure class without matching on individual variants.

pub mod api;
pub mod broker;
mod error;
pub mod node;
pub mod process;
pub mod telemetry;
pub mod translate;
pub mod tuning;

pub use api::{ApiError, RestClient};
pub use broker::{BrokerError, EmbeddedBroker};
pub use error::ErrorKind;
pub use node::{NodeError, NodeState, NodeStatus, NodeSupervisor};
pub use process::{ProcessControl, ProcessError, SystemProcessControl};
pub use telemetry::TelemetryError;
pub use translate::TranslateError;
pub use tuning::{TuningError, TuningPipeline, TuningResult};

#[cfg(test)]
mod tests;
