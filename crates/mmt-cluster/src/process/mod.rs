//! Process supervision primitives shared by the broker and node supervisors.
//!
//! Liveness always comes from the operating system, never from the presence
//! of a pid file: a pid file naming a dead process means "not running".

mod control;
mod errors;
mod files;
mod pidfile;
mod retry;

pub use control::{LaunchSpec, ProcessControl, SystemProcessControl};
pub use errors::ProcessError;
pub use pidfile::PidFile;
pub use retry::RetryPolicy;

pub(crate) use files::{read_optional_file, remove_if_exists};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
