use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Decoder weights keyed by feature name, one value per component.
pub type FeatureWeights = BTreeMap<String, Vec<f64>>;

/// A named translation memory held by the node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Domain {
    /// Numeric identifier.
    pub id: u64,
    /// Display name; not necessarily unique.
    pub name: String,
}

/// Relevance of one domain to a context.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ContextScore {
    /// Domain id. The node reports either a bare id or a full domain object.
    #[serde(deserialize_with = "domain_id")]
    pub domain: u64,
    /// Relevance score.
    pub score: f64,
}

fn domain_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Reference {
        Id(u64),
        Domain { id: u64 },
    }

    match Reference::deserialize(deserializer)? {
        Reference::Id(id) | Reference::Domain { id } => Ok(id),
    }
}

/// Serialises context weights as comma-separated `id:score` pairs.
#[must_use]
pub fn encode_context(context: &[ContextScore]) -> String {
    context
        .iter()
        .map(|entry| format!("{}:{:.6}", entry.domain, entry.score))
        .collect::<Vec<_>>()
        .join(",")
}

/// A translation session bound to a context.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Session {
    /// Session identifier.
    pub id: u64,
}

/// Optional parameters of a translation request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationOptions {
    /// Session to translate in.
    pub session: Option<u64>,
    /// Number of alternative hypotheses to return.
    pub nbest: Option<u32>,
    /// Context weights applied when no session is given.
    pub context: Option<Vec<ContextScore>>,
}

/// Result of translating one sentence.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Translation {
    /// Best translation.
    pub translation: String,
    /// Alternative hypotheses, present when requested.
    #[serde(default)]
    pub nbest: Vec<NBestEntry>,
}

/// One hypothesis of an n-best list.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NBestEntry {
    /// Hypothesis text.
    pub translation: String,
    /// Feature scores.
    pub scores: FeatureWeights,
    /// Weighted total score.
    #[serde(rename = "totalScore")]
    pub total_score: f64,
}
