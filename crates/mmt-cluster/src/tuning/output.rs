//! Parsing of the optimizer's final configuration file.

use std::num::ParseFloatError;

use thiserror::Error;

use crate::api::FeatureWeights;

const WEIGHT_SECTION: &str = "[weight]";
const SCORE_PREFIX: &str = "# BLEU";

/// Outcome of a tuning run.
#[derive(Debug, Clone, PartialEq)]
pub struct TuningResult {
    /// BLEU score reached on the tuning set, in `[0, 1]`.
    pub bleu: f64,
    /// Optimized decoder weights.
    pub weights: FeatureWeights,
}

/// Malformed content in an optimizer configuration file.
#[derive(Debug, Error)]
pub enum OptimizerOutputError {
    /// The file carries no `[weight]` section.
    #[error("no [weight] section found")]
    MissingWeights,
    /// The BLEU comment has no score token.
    #[error("line {line}: BLEU line carries no score")]
    MissingScore {
        /// One-based line number.
        line: usize,
    },
    /// A number could not be parsed.
    #[error("line {line}: invalid number '{token}': {source}")]
    InvalidNumber {
        /// One-based line number.
        line: usize,
        /// Offending token.
        token: String,
        /// Parse failure.
        #[source]
        source: ParseFloatError,
    },
}

/// Extracts the BLEU score and the weights from an optimizer configuration.
///
/// Every non-empty line after `[weight]` is a `name= v1 v2 ...` entry. Before
/// that section a `# BLEU <iteration> <score> ...` comment carries the score
/// as the third token after the `#`, and defaults to zero when absent.
pub fn parse_optimizer_output(content: &str) -> Result<TuningResult, OptimizerOutputError> {
    let mut bleu = 0.0;
    let mut weights = FeatureWeights::new();
    let mut in_weights = false;

    for (index, raw) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if in_weights {
            let mut tokens = line.split_whitespace();
            let Some(name) = tokens.next() else {
                continue;
            };
            let values = tokens
                .map(|token| parse_number(token, line_number))
                .collect::<Result<Vec<_>, _>>()?;
            weights.insert(name.trim_end_matches('=').to_owned(), values);
        } else if line.starts_with(SCORE_PREFIX) {
            let token = line
                .trim_start_matches('#')
                .split_whitespace()
                .nth(2)
                .ok_or(OptimizerOutputError::MissingScore { line: line_number })?;
            bleu = parse_number(token, line_number)?;
        } else if line == WEIGHT_SECTION {
            in_weights = true;
        }
    }

    if !in_weights {
        return Err(OptimizerOutputError::MissingWeights);
    }
    Ok(TuningResult { bleu, weights })
}

fn parse_number(token: &str, line: usize) -> Result<f64, OptimizerOutputError> {
    token
        .parse()
        .map_err(|source| OptimizerOutputError::InvalidNumber {
            line,
            token: token.to_owned(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn weights_and_score_are_extracted() {
        let content = "# BLEU 0 0.3456 on dev\n[feature]\nDM0\n\n[weight]\nDM0= 1.0 0.0\n  WordPenalty0= -0.25\n";

        let result = parse_optimizer_output(content).expect("valid output");

        assert!((result.bleu - 0.3456).abs() < f64::EPSILON);
        assert_eq!(result.weights.len(), 2);
        assert_eq!(result.weights["DM0"], vec![1.0, 0.0]);
        assert_eq!(result.weights["WordPenalty0"], vec![-0.25]);
    }

    #[rstest]
    #[case("# BLEU 0 0.3456 on dev\n[weight]\nDM0= 1.0 0.0\n")]
    #[case("# BLEU   7\t0.3456\n\n[weight]\nDM0= 1.0 0.0\n")]
    fn score_is_the_third_token_after_the_hash(#[case] content: &str) {
        let result = parse_optimizer_output(content).expect("valid output");

        assert!((result.bleu - 0.3456).abs() < f64::EPSILON, "BLEU was {}", result.bleu);
        assert_eq!(result.weights["DM0"], vec![1.0, 0.0]);
    }

    #[rstest]
    fn score_defaults_to_zero() {
        let result = parse_optimizer_output("[weight]\nLM0= 0.5\n").expect("valid output");

        assert!(result.bleu.abs() < f64::EPSILON);
    }

    #[rstest]
    fn missing_weight_section_is_rejected() {
        let error = parse_optimizer_output("# BLEU 0 0.3\nDM0= 1.0\n").expect_err("no weights");

        assert!(matches!(error, OptimizerOutputError::MissingWeights));
    }

    #[rstest]
    #[case("[weight]\nDM0= 1.0 abc\n", 2)]
    #[case("# BLEU 0 high\n[weight]\n", 1)]
    fn bad_numbers_report_their_line(#[case] content: &str, #[case] expected_line: usize) {
        let error = parse_optimizer_output(content).expect_err("bad number");

        match error {
            OptimizerOutputError::InvalidNumber { line, .. } => assert_eq!(line, expected_line),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[rstest]
    fn truncated_score_line_is_rejected() {
        let error = parse_optimizer_output("# BLEU 0\n[weight]\n").expect_err("no score");

        assert!(matches!(error, OptimizerOutputError::MissingScore { line: 1 }));
    }
}
