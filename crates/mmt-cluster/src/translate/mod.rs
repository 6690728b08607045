//! Interactive and batch translation through the node's REST API.

mod context;
mod errors;
mod executor;
mod session;

pub use context::{ContextSource, parse_context_weights};
pub use errors::TranslateError;
pub use executor::{
    BatchExecutor, DEFAULT_BATCH_WORKERS, ExecutorOutput, InteractiveExecutor, format_nbest,
};
pub use session::TranslationSession;

pub(crate) const TRANSLATE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::translate");
