//! Cluster node supervision.
//!
//! The node publishes its progress through a `key=value` status file. The
//! supervisor only reads that file; liveness always comes from the process
//! itself.

mod errors;
mod status;
mod supervisor;

pub use errors::NodeError;
pub use status::{NodeState, NodeStatus, NodeStatusParseError};
pub use supervisor::{NodeLiveness, NodeSettings, NodeSupervisor};

pub(crate) const NODE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::node");
