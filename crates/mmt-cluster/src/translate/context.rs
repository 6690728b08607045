use camino::Utf8PathBuf;

use super::errors::TranslateError;
use crate::api::{ContextScore, TranslationApi};

/// Where the context of a translation session comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextSource {
    /// Context analysed from a piece of text.
    Text(String),
    /// Context analysed from a file readable by the node.
    File(Utf8PathBuf),
    /// Explicit domain weights.
    Weights(Vec<ContextScore>),
}

impl ContextSource {
    /// Produces the domain weights, asking the node when needed.
    pub fn resolve(&self, api: &dyn TranslationApi) -> Result<Vec<ContextScore>, TranslateError> {
        match self {
            Self::Text(text) => Ok(api.context_from_text(text, None)?),
            Self::File(path) => Ok(api.context_from_file(path, None)?),
            Self::Weights(weights) => Ok(weights.clone()),
        }
    }
}

/// Parses comma-separated `id:score` pairs.
///
/// # Errors
///
/// Returns [`TranslateError::InvalidContextWeights`] when a pair lacks a
/// colon, the id is not an integer or the score is not a number.
pub fn parse_context_weights(text: &str) -> Result<Vec<ContextScore>, TranslateError> {
    let invalid = || TranslateError::InvalidContextWeights {
        text: text.to_owned(),
    };
    text.split(',')
        .map(|pair| {
            let (id, score) = pair.split_once(':').ok_or_else(invalid)?;
            Ok(ContextScore {
                domain: id.trim().parse().map_err(|_| invalid())?,
                score: score.trim().parse().map_err(|_| invalid())?,
            })
        })
        .collect()
}
