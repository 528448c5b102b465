//! Response decoding: raw completion → [`AnalysisResult`].
//!
//! The completion is untrusted input. Models regularly wrap JSON in a
//! ```` ```json ```` fence even when told not to, and sometimes return the
//! wrong types or drop fields. Decoding therefore goes through three steps:
//!
//! 1. Trim, then strip one leading and one trailing code fence
//! 2. Parse into a loose [`serde_json::Value`]
//! 3. Validate against [`ANALYSIS_SCHEMA`], collecting every violation,
//!    and only then convert to the typed result
//!
//! Fences inside the JSON (e.g. within a string) are left alone.

use crate::error::AnalysisError;
use crate::output::AnalysisResult;
use crate::schema::{validate, ANALYSIS_SCHEMA, CHALLENGE_COUNT};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static RE_LEADING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^```(?:json)?\s*").unwrap());

static RE_TRAILING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*```$").unwrap());

/// Decode the model's reply into a validated [`AnalysisResult`].
pub fn decode_response(raw: &str) -> Result<AnalysisResult, AnalysisError> {
    let cleaned = strip_code_fences(raw);

    let value: serde_json::Value =
        serde_json::from_str(&cleaned).map_err(|e| AnalysisError::MalformedModelOutput {
            detail: format!("not valid JSON: {e}"),
        })?;

    let violations = validate(&value, ANALYSIS_SCHEMA);
    if !violations.is_empty() {
        return Err(AnalysisError::MalformedModelOutput {
            detail: format!(
                "{} schema violation(s): {}",
                violations.len(),
                violations.join("; ")
            ),
        });
    }

    let result: AnalysisResult =
        serde_json::from_value(value).map_err(|e| AnalysisError::MalformedModelOutput {
            detail: e.to_string(),
        })?;

    if result.challenges.len() != CHALLENGE_COUNT {
        warn!(
            "Model returned {} challenges, expected {}",
            result.challenges.len(),
            CHALLENGE_COUNT
        );
    }
    Ok(result)
}

/// Trim, then remove one optional leading fence (with or without a `json`
/// tag) and one optional trailing fence.
pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_leading = RE_LEADING_FENCE.replace(trimmed, "");
    let without_trailing = RE_TRAILING_FENCE.replace(&without_leading, "");
    if without_trailing.len() != trimmed.len() {
        warn!("Model wrapped its reply in a code fence");
    }
    without_trailing.trim().to_string()
}
