//! Error types for the sdg-insights library.
//!
//! Every failure in the pipeline is terminal for the request and is reported
//! as exactly one [`AnalysisError`]. Each variant maps to an [`ErrorKind`]
//! so callers can tell "fix your input" apart from "try again later" and from
//! "the upstream model misbehaved" without string matching.
//!
//! Nothing here is retried automatically. The HTTP layer turns
//! [`AnalysisError::status_code`] into a response status and the `Display`
//! text into the `error` field of the body.

use thiserror::Error;

/// All errors returned by the sdg-insights library.
#[derive(Debug, Error)]
pub enum AnalysisError {
    // ── Caller errors ─────────────────────────────────────────────────────
    /// Missing or malformed identifier, wrong file type, oversize file, or
    /// no content at all.
    #[error("{reason}")]
    InvalidInput { reason: String },

    /// The record exists but yielded too little text to analyse.
    #[error(
        "Could not extract enough text from {pmcid} ({chars} characters). \
It may not be available as open-access full text."
    )]
    InsufficientContent { pmcid: String, chars: usize },

    // ── Upstream errors ───────────────────────────────────────────────────
    /// The remote record service could not be reached or answered non-2xx.
    ///
    /// `context` names the upstream call that failed.
    #[error("Upstream service unavailable: {context}")]
    UpstreamUnavailable { context: String },

    /// The extraction model call itself failed.
    #[error("Failed to generate insights: {message}")]
    ExtractionFailed { message: String },

    /// The model replied, but not with the structure we asked for.
    #[error("Model returned malformed output: {detail}")]
    MalformedModelOutput { detail: String },

    // ── Operator errors ───────────────────────────────────────────────────
    /// A required credential or setting is missing or invalid.
    ///
    /// `hint` names the setting, never its value.
    #[error("Server misconfiguration: {hint}")]
    ServerMisconfiguration { hint: String },
}

/// Coarse classification of an [`AnalysisError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    UpstreamUnavailable,
    InsufficientContent,
    ExtractionFailed,
    MalformedModelOutput,
    ServerMisconfiguration,
}

impl AnalysisError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        AnalysisError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::InvalidInput { .. } => ErrorKind::InvalidInput,
            AnalysisError::InsufficientContent { .. } => ErrorKind::InsufficientContent,
            AnalysisError::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            AnalysisError::ExtractionFailed { .. } => ErrorKind::ExtractionFailed,
            AnalysisError::MalformedModelOutput { .. } => ErrorKind::MalformedModelOutput,
            AnalysisError::ServerMisconfiguration { .. } => ErrorKind::ServerMisconfiguration,
        }
    }

    /// HTTP status equivalent for this error.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidInput => 400,
            ErrorKind::InsufficientContent => 422,
            ErrorKind::ServerMisconfiguration => 500,
            ErrorKind::UpstreamUnavailable
            | ErrorKind::ExtractionFailed
            | ErrorKind::MalformedModelOutput => 502,
        }
    }

    /// True when the caller must change the request before trying again.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
