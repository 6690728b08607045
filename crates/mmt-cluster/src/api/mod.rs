//! Typed access to the node's REST API.
//!
//! Every response is wrapped in a JSON envelope whose `data` field carries the
//! payload. [`RestClient`] unwraps the envelope; the traits below narrow the
//! surface each consumer needs so tests can substitute doubles.

mod client;
mod domains;
mod errors;
mod payloads;

use camino::Utf8Path;
use serde_json::Value;

pub use client::{DEFAULT_TIMEOUT, RestClient};
pub use domains::{DomainSelector, append_to_domain, create_domain_from_tmx, resolve_domain};
pub use errors::ApiError;
pub use payloads::{
    ContextScore, Domain, FeatureWeights, NBestEntry, Session, Translation, TranslationOptions,
    encode_context,
};

pub(crate) const API_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::api");

/// Decoder feature weights endpoint.
pub trait DecoderFeatures {
    /// Replaces the decoder weights in one update.
    fn update_features(&self, weights: &FeatureWeights) -> Result<(), ApiError>;
}

/// Domain management endpoints.
pub trait DomainApi {
    /// Lists every domain.
    fn domains(&self) -> Result<Vec<Domain>, ApiError>;

    /// Creates an empty domain.
    fn create_domain(&self, name: &str) -> Result<Domain, ApiError>;

    /// Starts importing a TMX file into a domain.
    fn import_into_domain(&self, domain: u64, tmx: &Utf8Path) -> Result<Option<Value>, ApiError>;

    /// Appends one sentence pair to a domain.
    fn append_to_domain(
        &self,
        domain: u64,
        source: &str,
        target: &str,
    ) -> Result<Option<Value>, ApiError>;
}

/// Context analysis, session and translation endpoints.
pub trait TranslationApi: Send + Sync {
    /// Scores domains against a piece of text.
    fn context_from_text(&self, text: &str, limit: Option<u32>)
    -> Result<Vec<ContextScore>, ApiError>;

    /// Scores domains against a file readable by the node.
    fn context_from_file(
        &self,
        path: &Utf8Path,
        limit: Option<u32>,
    ) -> Result<Vec<ContextScore>, ApiError>;

    /// Opens a session bound to a context.
    fn create_session(&self, context: &[ContextScore]) -> Result<Session, ApiError>;

    /// Closes a session.
    fn close_session(&self, session: u64) -> Result<(), ApiError>;

    /// Translates one sentence.
    fn translate(&self, source: &str, options: &TranslationOptions)
    -> Result<Translation, ApiError>;
}
