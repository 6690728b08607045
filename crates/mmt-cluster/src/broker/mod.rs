//! Embedded coordination service and message broker pair.
//!
//! A leader node needs a running coordination service and a broker before it
//! starts. Both are launched from the broker distribution, share one log file,
//! and are recorded together in a single pid file as
//! `<brokerPid> <coordinationPid>`.

mod bootstrap;
mod config;
mod errors;
mod probe;

pub use bootstrap::{BrokerPids, BrokerSettings, EmbeddedBroker};
pub use config::{BrokerEndpoint, render_broker_config, render_coordination_config};
pub use errors::BrokerError;
pub use probe::{BROKER_READY_MARKER, log_contains_marker, probe_coordination};

pub(crate) const BROKER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::broker");
