//! Parameter tuning against a running node.
//!
//! A run tokenizes the reference side of the tuning corpora, merges each side
//! into one file, hands both to an external optimizer that translates through
//! the node's API, and finally pushes the optimized decoder weights back to the
//! node. The optimizer and tokenizer are external programs reached through the
//! [`Optimizer`] and [`Tokenizer`] seams.

mod command;
mod corpus;
mod errors;
mod optimizer;
mod output;
mod pipeline;
mod reporter;
mod tokenizer;
mod workspace;

pub use corpus::{BilingualCorpus, LanguagePair};
pub use errors::TuningError;
pub use optimizer::{MertOptimizer, Optimizer, OptimizerRequest};
pub use output::{OptimizerOutputError, TuningResult, parse_optimizer_output};
pub use pipeline::{TuningCollaborators, TuningOptions, TuningPipeline, TuningSettings};
pub use reporter::{StructuredTuningReporter, TuningBanner, TuningReporter, TuningStage};
pub use tokenizer::{CommandTokenizer, Tokenizer};
pub use workspace::TuningWorkspace;

pub(crate) const TUNING_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::tuning");
